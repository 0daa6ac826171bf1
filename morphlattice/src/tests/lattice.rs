use std::collections::BTreeSet;

use crate::Tokenizer;
use crate::test_utils::*;

const INPUT: &str = "bacababa";

fn expected_spans(input: &str, words: &[&str]) -> BTreeSet<(usize, usize)> {
    let chars: Vec<char> = input.chars().collect();
    let mut spans = BTreeSet::new();
    for i in 0..chars.len() {
        for j in i + 1..=chars.len() {
            let s: String = chars[i..j].iter().collect();
            if words.contains(&s.as_str()) {
                spans.insert((i, j));
            }
        }
    }
    spans
}

#[test]
fn test_every_match_is_seeded() {
    let tokenizer = Tokenizer::new(build_dictionary(SMALL_LEXICON)).compact_nodes(false);
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence(INPUT);
    let stats = worker.build_lattice().unwrap();

    let seeds: BTreeSet<_> = worker
        .builder()
        .seeds()
        .iter()
        .map(|s| (s.start, s.end))
        .collect();
    let expected = expected_spans(INPUT, &["a", "b", "c", "ba", "ab", "ca"]);
    assert_eq!(seeds, expected);
    assert_eq!(stats.dic_seeds, expected.len());
    assert_eq!(stats.unk_seeds, 0);
    assert_eq!(stats.inaccessible, 0);
    assert!((0..=INPUT.len()).all(|p| worker.builder().is_accessible(p)));
}

#[test]
fn test_boundaries_follow_positions() {
    let tokenizer = Tokenizer::new(build_dictionary(SMALL_LEXICON));
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence(INPUT);
    worker.build_lattice().unwrap();

    let lattice = worker.lattice();
    let len = INPUT.len();
    assert_eq!(lattice.created_boundary_count(), len + 2);
    assert_eq!(lattice.boundary(0).num_nodes(), 1);
    assert_eq!(lattice.boundary(len + 1).num_nodes(), 1);
    for b in 1..=len {
        let bnd = lattice.boundary(b);
        assert!(bnd.num_nodes() > 0);
        for node in bnd.nodes() {
            assert_eq!(node.start, b - 1);
            assert!(node.end > node.start);
        }
        for end in bnd.ends() {
            assert!((end.boundary as usize) < b);
            assert_eq!(lattice.node(*end).end + 1, b);
        }
    }
}

#[test]
fn test_inaccessible_boundaries_are_empty() {
    let tokenizer = Tokenizer::new(build_dictionary("abc,N,1\nb,B,2\nbc,N,3\n"));
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("abc");
    let stats = worker.build_lattice().unwrap();

    assert_eq!(stats.inaccessible, 2);
    let builder = worker.builder();
    assert!(builder.is_accessible(0));
    assert!(!builder.is_accessible(1));
    assert!(!builder.is_accessible(2));
    assert!(builder.is_accessible(3));

    let lattice = worker.lattice();
    assert_eq!(lattice.boundary(1).num_nodes(), 1);
    assert_eq!(lattice.boundary(2).num_nodes(), 0);
    assert_eq!(lattice.boundary(3).num_nodes(), 0);
    assert_eq!(lattice.boundary(4).ends().len(), 1);
}

#[test]
fn test_seed_ending_in_dead_position_is_skipped() {
    // "ab" reaches position 2, from which nothing continues.
    let tokenizer = Tokenizer::new(build_dictionary("a,A,1\nab,N,2\nbc,N,3\n"));
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("abc");
    worker.build_lattice().unwrap();

    let lattice = worker.lattice();
    let first: Vec<_> = lattice.boundary(1).nodes().iter().map(|n| n.end).collect();
    assert_eq!(first, vec![1]);
}

#[test]
fn test_disconnected_input_fails_and_recovers() {
    let tokenizer = Tokenizer::new(build_dictionary(SMALL_LEXICON));
    let mut worker = tokenizer.new_worker();

    worker.reset_sentence("abx");
    let err = worker.build_lattice().unwrap_err();
    assert!(err.is_invalid_state());
    assert!(worker.analyze(&zero_scorer()).is_err());
    assert_eq!(worker.num_tokens(), 0);

    worker.reset_sentence("ab");
    worker.analyze(&zero_scorer()).unwrap();
    let covered: usize = worker.token_iter().map(|t| t.range_char().len()).sum();
    assert_eq!(covered, 2);
}

#[test]
fn test_max_input_length() {
    let tokenizer = Tokenizer::new(build_dictionary(SMALL_LEXICON)).max_input_length(4);
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("ababa");
    let err = worker.build_lattice().unwrap_err();
    assert!(!err.is_invalid_state());

    worker.reset_sentence("abab");
    worker.build_lattice().unwrap();
}

#[test]
fn test_empty_input() {
    let tokenizer = Tokenizer::new(build_dictionary(SMALL_LEXICON));
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("");
    worker.analyze(&zero_scorer()).unwrap();
    assert_eq!(worker.num_tokens(), 0);
    assert_eq!(worker.lattice().created_boundary_count(), 2);
}

#[test]
fn test_used_memory_grows_with_seeds() {
    let tokenizer = Tokenizer::new(build_dictionary(SMALL_LEXICON));
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("a");
    worker.build_lattice().unwrap();
    let small = worker.builder().used_memory();
    worker.reset_sentence(INPUT);
    worker.build_lattice().unwrap();
    assert!(worker.builder().used_memory() > small);
}
