use crate::analysis::lattice::ConnectionPtr;
use crate::test_utils::*;
use crate::Tokenizer;

#[test]
fn test_traversal_visits_every_element() {
    let tokenizer = Tokenizer::new(build_dictionary(SMALL_LEXICON));
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("bacababa");
    worker.analyze(&zero_scorer()).unwrap();

    let total = worker.path().total_nodes();
    let num_boundaries = worker.path().num_boundaries();
    assert_eq!(num_boundaries, worker.num_tokens());

    let path = worker.path_mut();
    path.reset();
    let mut visited = 0;
    let mut boundaries = 0;
    let mut last = usize::MAX;
    let mut ptr = ConnectionPtr {
        boundary: 0,
        left: 0,
        right: 0,
        beam: 0,
        previous: None,
    };
    while path.next_boundary() {
        let current = path.current_boundary().unwrap();
        assert!(current < last);
        last = current;
        boundaries += 1;
        while path.next_node(&mut ptr) {
            assert_eq!(ptr.boundary as usize, current);
            visited += 1;
        }
    }
    assert_eq!(visited, total);
    assert_eq!(boundaries, num_boundaries);
    assert!(path.is_last_boundary());
}

#[test]
fn test_path_matches_tokens() {
    let tokenizer = Tokenizer::new(build_dictionary(SMALL_LEXICON));
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("bacababa");
    worker.analyze(&zero_scorer()).unwrap();

    let path = worker.path();
    let n = path.num_boundaries();
    for (i, token) in worker.token_iter().enumerate() {
        let (elem, score) = path.path_element(n - 1 - i);
        assert_eq!(elem.boundary as usize, token.range_char().start + 1);
        assert_eq!(score, token.score());
    }
    // Consecutive path elements are linked through their beams.
    for idx in 0..n.saturating_sub(1) {
        let step1 = path.chunk(idx)[0];
        let step0 = path.chunk(idx + 1)[0];
        assert!(path.contains(&step0, &step1));
    }
}

#[test]
fn test_move_to_boundary_on_path() {
    let tokenizer = Tokenizer::new(build_dictionary(SMALL_LEXICON));
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("bacababa");
    worker.analyze(&zero_scorer()).unwrap();

    let starts: Vec<usize> = worker.token_iter().map(|t| t.range_char().start + 1).collect();
    let path = worker.path_mut();
    for &b in starts.iter().rev() {
        assert!(path.move_to_boundary(b));
        assert_eq!(path.current_boundary(), Some(b));
    }

    path.reset();
    let first = starts[starts.len() - 1];
    assert!(path.move_to_boundary(first));
    if first > 1 && !starts.contains(&(first - 1)) {
        assert!(!path.move_to_boundary(first - 1));
        assert_eq!(path.current_boundary(), Some(first));
    }
}
