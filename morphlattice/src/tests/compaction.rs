use std::collections::BTreeSet;
use std::sync::Arc;

use crate::analysis::extra_nodes::ExtraNodeKind;
use crate::analysis::walker::NodeWalker;
use crate::test_utils::*;
use crate::{HashedFeatureScorer, ScorerDef, Tokenizer, Worker};

const LEXICON: &str = "\
a,N,x,1
a,N,x,5
a,N,y,2
a,V,x,3
b,N,x,4
";

fn worker(compact: bool) -> Worker {
    let dict = build_dictionary_with_subpos(LEXICON);
    let tokenizer = Tokenizer::new(dict)
        .feature_fields(&["pos"])
        .unwrap()
        .compact_nodes(compact);
    tokenizer.new_worker()
}

fn scorer() -> ScorerDef {
    let weights = (0..256).map(|i| ((i * 7919) % 13) as f32 - 6.0).collect();
    ScorerDef::new(Arc::new(HashedFeatureScorer::new(weights).unwrap()))
}

#[test]
fn test_compaction_folds_same_projection() {
    let mut worker = worker(true);
    worker.reset_sentence("a");
    let stats = worker.build_lattice().unwrap();

    assert_eq!(stats.compacted, 1);
    let bnd = worker.lattice().boundary(1);
    assert_eq!(bnd.num_nodes(), 2);
    let aliases: Vec<_> = bnd
        .nodes()
        .iter()
        .filter(|n| {
            worker
                .extra_nodes()
                .node(n.ptr)
                .is_some_and(|x| x.kind() == ExtraNodeKind::Alias)
        })
        .collect();
    assert_eq!(aliases.len(), 1);
    assert_eq!(worker.extra_nodes().alias_members(aliases[0].ptr).len(), 2);
}

#[test]
fn test_expansion_reproduces_seeds() {
    let mut worker = worker(true);
    worker.reset_sentence("a");
    worker.build_lattice().unwrap();

    let dict = worker.tokenizer.dictionary();
    let original: BTreeSet<_> = lookup_all(dict, "a").into_iter().collect();
    assert_eq!(original.len(), 3);

    let mut walker = NodeWalker::new(dict.entries(), worker.extra_nodes());
    let mut expanded = BTreeSet::new();
    let mut readings = vec![];
    let reading = dict.fields().field_by_name("reading").unwrap();
    for node in worker.lattice().boundary(1).nodes() {
        walker.init(node.ptr).unwrap();
        while walker.next().unwrap() {
            expanded.insert(walker.current_ptr());
            readings.push(reading.string_of(walker.data()[0]).unwrap().to_string());
        }
    }
    assert_eq!(expanded, original);
    readings.sort();
    assert_eq!(readings, vec!["1", "2", "3", "5"]);
}

#[test]
fn test_compaction_disabled() {
    let mut worker = worker(false);
    worker.reset_sentence("a");
    let stats = worker.build_lattice().unwrap();
    assert_eq!(stats.compacted, 0);
    assert_eq!(worker.lattice().boundary(1).num_nodes(), 3);
}

#[test]
fn test_compaction_keeps_best_score() {
    let def = scorer();
    let mut results = vec![];
    for compact in [true, false] {
        let mut worker = worker(compact);
        worker.reset_sentence("abab");
        worker.analyze(&def).unwrap();
        let surfaces: Vec<_> = worker.token_iter().map(|t| t.surface().to_string()).collect();
        results.push((worker.top1_score().unwrap(), surfaces));
    }
    assert_eq!(results[0], results[1]);
}
