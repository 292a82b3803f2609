//! Bytecode decoding into the typed instruction stream.

use crate::model::{CallSite, Constant, Instruction, InvokeKind};

use super::attributes::BootstrapMethod;
use super::constant_pool::ConstantPool;
use super::reader::ByteReader;
use super::{DecodeResult, MalformedClassError};

const LAMBDA_METAFACTORY: &str = "java.lang.invoke.LambdaMetafactory";

/// Operand byte count of fixed-length opcodes; `None` for invalid opcodes
/// and for the variable-length `tableswitch`, `lookupswitch` and `wide`.
fn operand_len(opcode: u8) -> Option<usize> {
    let len = match opcode {
        0x00..=0x0f => 0,
        0x10 => 1,
        0x11 => 2,
        0x12 => 1,
        0x13 | 0x14 => 2,
        0x15..=0x19 => 1,
        0x1a..=0x35 => 0,
        0x36..=0x3a => 1,
        0x3b..=0x83 => 0,
        0x84 => 2,
        0x85..=0x98 => 0,
        0x99..=0xa8 => 2,
        0xa9 => 1,
        0xac..=0xb1 => 0,
        0xb2..=0xb8 => 2,
        0xb9 | 0xba => 4,
        0xbb => 2,
        0xbc => 1,
        0xbd => 2,
        0xbe | 0xbf => 0,
        0xc0 | 0xc1 => 2,
        0xc2 | 0xc3 => 0,
        0xc5 => 3,
        0xc6 | 0xc7 => 2,
        0xc8 | 0xc9 => 4,
        _ => return None,
    };
    Some(len)
}

/// Decodes one method body.
pub(crate) fn decode_code(
    code: &[u8],
    pool: &ConstantPool,
    bootstrap: &[BootstrapMethod],
) -> DecodeResult<Vec<Instruction>> {
    let mut reader = ByteReader::new(code);
    let mut out = Vec::new();
    while !reader.is_empty() {
        let offset = reader.position();
        let opcode = reader.u8()?;
        let instruction = match opcode {
            0x01 => Instruction::LoadConstant(Constant::Null),
            0x02..=0x08 => Instruction::LoadConstant(Constant::Int(i32::from(opcode) - 3)),
            0x09 | 0x0a => Instruction::LoadConstant(Constant::Long(i64::from(opcode - 0x09))),
            0x0b..=0x0d => Instruction::LoadConstant(Constant::Float(f32::from(opcode - 0x0b))),
            0x0e | 0x0f => Instruction::LoadConstant(Constant::Double(f64::from(opcode - 0x0e))),
            0x10 => Instruction::LoadConstant(Constant::Int(i32::from(reader.i8()?))),
            0x11 => Instruction::LoadConstant(Constant::Int(i32::from(reader.i16()?))),
            0x12 => {
                let index = u16::from(reader.u8()?);
                loadable(pool, index, opcode)?
            }
            0x13 | 0x14 => {
                let index = reader.u16()?;
                loadable(pool, index, opcode)?
            }
            0xaa => {
                skip_padding(&mut reader, offset)?;
                reader.skip(4)?;
                let low = reader.i32()?;
                let high = reader.i32()?;
                let entries = i64::from(high) - i64::from(low) + 1;
                let count = usize::try_from(entries)
                    .map_err(|_| MalformedClassError::BadSwitch { offset })?;
                reader.skip(count.saturating_mul(4))?;
                Instruction::Other(opcode)
            }
            0xab => {
                skip_padding(&mut reader, offset)?;
                reader.skip(4)?;
                let pairs = usize::try_from(reader.i32()?)
                    .map_err(|_| MalformedClassError::BadSwitch { offset })?;
                reader.skip(pairs.saturating_mul(8))?;
                Instruction::Other(opcode)
            }
            0xac..=0xb1 => Instruction::Return,
            0xb2 => Instruction::GetStatic(pool.field_ref(reader.u16()?)?),
            0xb6 => Instruction::InvokeMethod(pool.method_ref(reader.u16()?, InvokeKind::Virtual)?),
            0xb7 => Instruction::InvokeMethod(pool.method_ref(reader.u16()?, InvokeKind::Special)?),
            0xb8 => Instruction::InvokeMethod(pool.method_ref(reader.u16()?, InvokeKind::Static)?),
            0xb9 => {
                let index = reader.u16()?;
                reader.skip(2)?;
                Instruction::InvokeMethod(pool.method_ref(index, InvokeKind::Interface)?)
            }
            0xba => {
                let index = reader.u16()?;
                reader.skip(2)?;
                Instruction::InvokeDynamic(call_site(pool, bootstrap, index)?)
            }
            0xbb => Instruction::NewObject(pool.class_name(reader.u16()?)?),
            0xbf => Instruction::Throw,
            0xc4 => {
                let widened = reader.u8()?;
                reader.skip(if widened == 0x84 { 4 } else { 2 })?;
                Instruction::Other(opcode)
            }
            other => {
                let len = operand_len(other).ok_or(MalformedClassError::UnknownOpcode {
                    opcode: other,
                    offset,
                })?;
                reader.skip(len)?;
                Instruction::Other(other)
            }
        };
        out.push(instruction);
    }
    Ok(out)
}

fn loadable(pool: &ConstantPool, index: u16, opcode: u8) -> DecodeResult<Instruction> {
    Ok(match pool.loadable(index)? {
        Some(constant) => Instruction::LoadConstant(constant),
        None => Instruction::Other(opcode),
    })
}

/// Switch operands start on a 4-byte boundary relative to the code start.
fn skip_padding(reader: &mut ByteReader<'_>, opcode_offset: usize) -> DecodeResult<()> {
    let pad = (4 - (opcode_offset + 1) % 4) % 4;
    reader.skip(pad)
}

fn call_site(
    pool: &ConstantPool,
    bootstrap: &[BootstrapMethod],
    index: u16,
) -> DecodeResult<CallSite> {
    let (bootstrap_index, name, descriptor) = pool.invoke_dynamic(index)?;
    let method = bootstrap
        .get(bootstrap_index as usize)
        .ok_or(MalformedClassError::BadBootstrapIndex(bootstrap_index))?;

    let factory = pool.method_handle(method.method_handle)?;
    let bound = match factory {
        Some(f) if f.owner == LAMBDA_METAFACTORY => match method.arguments.get(1) {
            Some(&implementation) => pool.method_handle(implementation)?,
            None => None,
        },
        _ => None,
    };

    Ok(CallSite {
        name: name.to_string(),
        descriptor: descriptor.to_string(),
        bound,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_pool() -> ConstantPool {
        ConstantPool::default()
    }

    #[test]
    fn test_small_constants_and_throw() {
        // iconst_m1, bipush -2, sipush 404, aconst_null, athrow, areturn
        let code = [0x02, 0x10, 0xFE, 0x11, 0x01, 0x94, 0x01, 0xbf, 0xb0];
        let instrs = decode_code(&code, &empty_pool(), &[]).unwrap();
        assert_eq!(
            instrs,
            vec![
                Instruction::LoadConstant(Constant::Int(-1)),
                Instruction::LoadConstant(Constant::Int(-2)),
                Instruction::LoadConstant(Constant::Int(404)),
                Instruction::LoadConstant(Constant::Null),
                Instruction::Throw,
                Instruction::Return,
            ]
        );
    }

    #[test]
    fn test_tableswitch_padding() {
        // nop, tableswitch at offset 1 -> 2 pad bytes, default, low=0, high=1, 2 offsets, return
        let mut code = vec![0x00, 0xaa, 0, 0];
        code.extend_from_slice(&[0, 0, 0, 0]);
        code.extend_from_slice(&[0, 0, 0, 0]);
        code.extend_from_slice(&[0, 0, 0, 1]);
        code.extend_from_slice(&[0; 8]);
        code.push(0xb1);
        let instrs = decode_code(&code, &empty_pool(), &[]).unwrap();
        assert_eq!(
            instrs,
            vec![
                Instruction::Other(0x00),
                Instruction::Other(0xaa),
                Instruction::Return
            ]
        );
    }

    #[test]
    fn test_lookupswitch_and_wide() {
        // lookupswitch at 0 -> 3 pad bytes, default, npairs=1, one pair; wide iinc; return
        let mut code = vec![0xab, 0, 0, 0];
        code.extend_from_slice(&[0, 0, 0, 0]);
        code.extend_from_slice(&[0, 0, 0, 1]);
        code.extend_from_slice(&[0; 8]);
        code.extend_from_slice(&[0xc4, 0x84, 0, 1, 0, 5]);
        code.push(0xb1);
        let instrs = decode_code(&code, &empty_pool(), &[]).unwrap();
        assert_eq!(instrs.len(), 3);
        assert_eq!(instrs[2], Instruction::Return);
    }

    #[test]
    fn test_unknown_opcode() {
        assert_eq!(
            decode_code(&[0x00, 0xcb], &empty_pool(), &[]),
            Err(MalformedClassError::UnknownOpcode {
                opcode: 0xcb,
                offset: 1
            })
        );
    }

    #[test]
    fn test_truncated_operand() {
        assert!(matches!(
            decode_code(&[0x11, 0x01], &empty_pool(), &[]),
            Err(MalformedClassError::UnexpectedEof { .. })
        ));
    }
}
