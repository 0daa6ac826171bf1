use std::collections::BTreeSet;

use crate::analysis::extra_nodes::{ExtraNodeKind, ExtraNodesContext};
use crate::analysis::lattice_builder::LatticeBuilder;
use crate::analysis::unk_nodes::{UnkMaker, UnkNodeConfig, UnkNodesContext, hash_unk_string};
use crate::dictionary::{CharClass, CharProperty, Dictionary};
use crate::sentence::Sentence;
use crate::test_utils::*;
use crate::{Tokenizer, Worker};

const LEXICON: &str = "\
AA,N,1
UNK,unk,0
";

fn template(dict: &Dictionary) -> UnkNodeConfig {
    let ptr = lookup_all(dict, "UNK")[0];
    UnkNodeConfig::from_entry(&dict.entries(), ptr)
        .unwrap()
        .replace_with_surface([0])
        .unwrap()
        .placeholder(0)
}

fn spawn(dict: &Dictionary, maker: &UnkMaker, input: &str) -> (Vec<(usize, usize)>, ExtraNodesContext) {
    let mut sent = Sentence::new();
    sent.set_sentence(input);
    sent.compile(&CharProperty::default());
    let mut builder = LatticeBuilder::default();
    builder.reset(sent.len_char());
    let mut xtra = ExtraNodesContext::new(dict.entries().num_features(), 1);
    let count = {
        let mut ctx = UnkNodesContext::new(&mut xtra, dict.entries());
        maker.spawn_nodes(&sent, &mut ctx, &mut builder)
    };
    assert_eq!(count, builder.seeds().len());
    let spans = builder.seeds().iter().map(|s| (s.start, s.end)).collect();
    (spans, xtra)
}

fn analyzed(dict: Dictionary, maker: UnkMaker, input: &str) -> Worker {
    let tokenizer = Tokenizer::new(dict).compact_nodes(false).add_unk_maker(maker);
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence(input);
    worker.build_lattice().unwrap();
    worker
}

#[test]
fn test_single_skips_positions_with_entries() {
    let dict = build_dictionary("a,A,1\nUNK,unk,0\n");
    let maker = UnkMaker::single(CharClass::Latin, template(&dict));
    let (spans, xtra) = spawn(&dict, &maker, "xay");
    assert_eq!(spans, vec![(0, 1), (2, 3)]);
    assert_eq!(xtra.num_nodes(), 2);
}

#[test]
fn test_single_with_prefix_only_entry() {
    let dict = build_dictionary(LEXICON);
    let maker = UnkMaker::single(CharClass::Latin, template(&dict));
    let worker = analyzed(dict, maker, "AA");

    let seeds: BTreeSet<_> = worker
        .builder()
        .seeds()
        .iter()
        .map(|s| (s.start, s.end, s.entry_ptr.is_special()))
        .collect();
    let expected = BTreeSet::from([(0, 1, true), (1, 2, true), (0, 2, false)]);
    assert_eq!(seeds, expected);
}

#[test]
fn test_chunking_with_prefix_only_entry() {
    let dict = build_dictionary(LEXICON);
    let maker = UnkMaker::chunking(CharClass::Latin, template(&dict));
    let worker = analyzed(dict, maker, "AA");

    let seeds: BTreeSet<_> = worker
        .builder()
        .seeds()
        .iter()
        .map(|s| (s.start, s.end, s.entry_ptr.is_special()))
        .collect();
    let expected = BTreeSet::from([(0, 1, true), (1, 2, true), (0, 2, false)]);
    assert_eq!(seeds, expected);
}

#[test]
fn test_chunking_run_without_matches() {
    let dict = build_dictionary(LEXICON);
    let maker = UnkMaker::chunking(CharClass::Latin, template(&dict));
    let (spans, _) = spawn(&dict, &maker, "xyz!w");

    let mut expected = vec![];
    for i in 0..3 {
        for j in i..3 {
            expected.push((i, j + 1));
        }
    }
    expected.push((4, 5));
    assert_eq!(spans, expected);
}

#[test]
fn test_chunking_run_leaving_dictionary_prefix() {
    // "AAB" leaves the trie at "B" after matching "AA".
    let dict = build_dictionary(LEXICON);
    let maker = UnkMaker::chunking(CharClass::Latin, template(&dict));
    let (spans, _) = spawn(&dict, &maker, "AAB");

    let spans: BTreeSet<_> = spans.into_iter().collect();
    let expected = BTreeSet::from([(0, 1), (0, 3), (1, 2), (1, 3), (2, 3)]);
    assert_eq!(spans, expected);
}

#[test]
fn test_unknown_node_features() {
    let dict = build_dictionary(LEXICON);
    let conf = template(&dict);
    let base = conf.base().to_vec();
    let maker = UnkMaker::single(CharClass::Latin, conf);
    let (_, xtra) = spawn(&dict, &maker, "xA");

    let unk_x = crate::dictionary::EntryPtr::special(0);
    let node = xtra.node(unk_x).unwrap();
    assert_eq!(node.kind(), ExtraNodeKind::Unknown);
    assert_eq!(node.span(), 0..1);
    assert_eq!(node.content_hash(), hash_unk_string(b"x"));

    let features = xtra.features(unk_x).unwrap();
    assert_eq!(features[0], hash_unk_string(b"x"));
    assert_eq!(features[1..], base[1..]);

    // "x" is not a dictionary prefix, "A" is.
    assert_eq!(xtra.placeholder(unk_x, 0), Some(1));
    let unk_a = crate::dictionary::EntryPtr::special(1);
    assert_eq!(xtra.placeholder(unk_a, 0), Some(0));
}

#[test]
fn test_make_ptr_from_entry() {
    let dict = build_dictionary(LEXICON);
    let conf = template(&dict);
    let aa = lookup_all(&dict, "AA")[0];

    let mut sent = Sentence::new();
    sent.set_sentence("AAB");
    sent.compile(&CharProperty::default());
    let mut xtra = ExtraNodesContext::new(dict.entries().num_features(), 1);
    let ptr = {
        let mut ctx = UnkNodesContext::new(&mut xtra, dict.entries());
        ctx.make_ptr_from_entry(&sent, 0, 3, &conf, aa, 7)
    };
    let node = xtra.node(ptr).unwrap();
    assert_eq!(node.template(), aa);
    assert_eq!(xtra.placeholder(ptr, 0), Some(7));

    let mut aa_features = vec![];
    dict.entries().features_into(aa, &mut aa_features).unwrap();
    let features = xtra.features(ptr).unwrap();
    assert_eq!(features[0], hash_unk_string("AAB".as_bytes()));
    assert_eq!(features[1], aa_features[1]);
}

#[test]
fn test_dic_pattern_matches() {
    let dict = build_dictionary("x,unk,1\ny,N,2\nUNK,unk,0\n");
    let conf = template(&dict);
    assert!(conf.dic_pattern_matches(dict.lookup("x").unwrap()));
    assert!(!conf.dic_pattern_matches(dict.lookup("y").unwrap()));
}

#[test]
fn test_unknown_tokens_in_analysis() {
    let dict = build_dictionary(LEXICON);
    let maker = UnkMaker::chunking(CharClass::Latin, template(&dict));
    let tokenizer = Tokenizer::new(dict).add_unk_maker(maker);
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("xyAA");
    worker.analyze(&zero_scorer()).unwrap();

    let covered: usize = worker.token_iter().map(|t| t.range_char().len()).sum();
    assert_eq!(covered, 4);
    for token in worker.token_iter() {
        if token.is_unknown() {
            assert_eq!(token.feature_str("surface"), Some(token.surface()));
            assert_eq!(token.feature_str("pos"), Some("unk"));
        }
    }
}

#[test]
fn test_compacted_unknown_nodes_stay_unknown() {
    let dict = build_dictionary(LEXICON);
    let conf = template(&dict);
    let tokenizer = Tokenizer::new(dict)
        .feature_fields(&["pos"])
        .unwrap()
        .add_unk_maker(UnkMaker::single(CharClass::Latin, conf.clone()))
        .add_unk_maker(UnkMaker::chunking(CharClass::Latin, conf));
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("x");
    worker.analyze(&zero_scorer()).unwrap();

    assert_eq!(worker.stats().unwrap().compacted, 1);
    let token = worker.token(0);
    let node = worker.extra_nodes().node(token.entry_ptr()).unwrap();
    assert_eq!(node.kind(), ExtraNodeKind::Alias);
    assert!(token.is_unknown());

    let mut expanded = 0;
    let mut walker = token.walker().unwrap();
    while walker.next().unwrap() {
        assert!(walker.current_ptr().is_special());
        expanded += 1;
    }
    assert_eq!(expanded, 2);
}
