//! Call-graph traversal from a handler method into business components.

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::context::AnalysisContext;
use crate::model::{
    Classification, Evidence, FailureSet, MethodDescriptor, MethodRef, MethodSignature,
    OriginLayer,
};
use crate::scanner::ExceptionProvenanceScanner;

/// Aggregated provenance of a traversal plus the call graph it explored.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub failures: FailureSet,
    pub graph: DiGraph<MethodSignature, ()>,
    nodes: HashMap<MethodSignature, NodeIndex>,
}

impl WalkOutcome {
    fn node(&mut self, signature: &MethodSignature) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(signature) {
            return idx;
        }
        let idx = self.graph.add_node(signature.clone());
        self.nodes.insert(signature.clone(), idx);
        idx
    }

    /// Whether the explored graph contains a call cycle.
    pub fn is_cyclic(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    pub fn contains(&self, signature: &MethodSignature) -> bool {
        self.nodes.contains_key(signature)
    }
}

pub struct CallGraphWalker<'a> {
    ctx: &'a AnalysisContext,
    scanner: &'a ExceptionProvenanceScanner<'a>,
}

impl<'a> CallGraphWalker<'a> {
    pub fn new(ctx: &'a AnalysisContext, scanner: &'a ExceptionProvenanceScanner<'a>) -> Self {
        Self { ctx, scanner }
    }

    /// Collects the provenance of `root` and of every business-component
    /// method reachable from it, each method scanned once.
    ///
    /// Root records keep the layer the scanner gave them; callee throws and
    /// unwraps are attributed to the business layer.
    pub fn walk(&self, root: &MethodDescriptor) -> WalkOutcome {
        let mut visited = HashSet::new();
        let mut outcome = WalkOutcome::default();
        visited.insert(root.signature());
        outcome.node(&root.signature());
        outcome.failures.extend(self.scanner.scan(root));
        self.expand(root, &mut visited, &mut outcome);
        outcome
    }

    /// Expands the callees of `method`, which must already be in `visited`.
    pub fn expand(
        &self,
        method: &MethodDescriptor,
        visited: &mut HashSet<MethodSignature>,
        outcome: &mut WalkOutcome,
    ) {
        let from = outcome.node(&method.signature());
        for callee in method.instructions.iter().filter_map(|i| i.invoked()) {
            for target in self.targets(callee) {
                let signature = target.signature();
                let to = outcome.node(&signature);
                outcome.graph.update_edge(from, to, ());
                if !visited.insert(signature) {
                    continue;
                }
                debug!(from = %method.signature(), to = %target.signature(), "following call");
                let found = self.scanner.scan(target).into_iter().map(|mut record| {
                    if matches!(record.evidence, Evidence::DirectThrow | Evidence::OptionalUnwrap) {
                        record.origin_layer = OriginLayer::BusinessLogicLayer;
                    }
                    record
                });
                outcome.failures.extend(found);
                self.expand(target, visited, outcome);
            }
        }
    }

    /// Methods a call may dispatch to that are worth following: business
    /// component implementations, with interface receivers resolved to
    /// their implementors.
    fn targets(&self, callee: &MethodRef) -> Vec<&'a MethodDescriptor> {
        let ctx: &'a AnalysisContext = self.ctx;
        let index = &ctx.index;
        let Some(receiver) = index.class_by_name(&callee.owner) else {
            return Vec::new();
        };

        if receiver.is_interface {
            return index
                .implementors(&receiver.name)
                .into_iter()
                .filter_map(|imp| index.resolve_method(&imp.name, &callee.name, &callee.descriptor).ok())
                .collect();
        }

        match index.resolve_method(&callee.owner, &callee.name, &callee.descriptor) {
            Ok(target) => {
                let followed = receiver.classification == Classification::BusinessComponent
                    || index.classification_of(&target.owner) == Classification::BusinessComponent;
                if followed {
                    vec![target]
                } else {
                    Vec::new()
                }
            }
            Err(e) => {
                debug!(error = %e, "skipping unresolved callee");
                Vec::new()
            }
        }
    }
}
