//! The read-only state shared by every analysis stage.

use tracing::info;

use crate::advice::AdviceRegistry;
use crate::classfile::JvmClassDecoder;
use crate::config::AnalysisConfig;
use crate::index::ClassIndex;
use crate::knowledge::StatusKnowledgeBase;

/// Index, advice, knowledge base and configuration for one run.
///
/// Built once after loading and never mutated, so it can be shared freely
/// across threads.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub index: ClassIndex,
    pub advice: AdviceRegistry,
    pub knowledge: StatusKnowledgeBase,
    pub config: AnalysisConfig,
}

impl AnalysisContext {
    /// Builds the context over an existing index. Knowledge-base rows from
    /// the configuration are layered over the built-in table.
    pub fn new(index: ClassIndex, config: AnalysisConfig) -> Self {
        let knowledge = config
            .knowledge_base
            .iter()
            .fold(StatusKnowledgeBase::builtin(), |kb, row| {
                kb.with_entry(&row.exception, row.status, &row.description)
            });
        let advice = AdviceRegistry::from_index(&index);
        info!(
            classes = index.len(),
            advice_mappings = advice.len(),
            knowledge_entries = knowledge.len(),
            "analysis context ready"
        );
        Self {
            index,
            advice,
            knowledge,
            config,
        }
    }

    /// Decodes class buffers and builds the context over them.
    pub fn load<B: AsRef<[u8]>>(buffers: &[B], config: AnalysisConfig) -> Self {
        let index = ClassIndex::load_with(&JvmClassDecoder, buffers, &config.data_access_interfaces);
        Self::new(index, config)
    }
}
