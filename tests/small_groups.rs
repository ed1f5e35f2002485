//! Random edits under small group and run sizes
//!
//! The configuration is process-wide, so everything that changes it lives in this single test.

use itertools::Itertools;
use maplit::btreemap;
use rand::{rngs::SmallRng, Rng, SeedableRng};

use texels::{config, tree, Config, Document, StyleMap};

fn bold_patch() -> StyleMap {
    btreemap! { "bold".to_string() => true.into() }
}

fn check(doc: &Document, model: &str) {
    let config = config::get();
    let root = doc.snapshot();
    tree::validate(&root).unwrap();
    assert!(tree::is_efficient(&root));

    // Every group below the root has at least `nmin` children, which bounds the depth
    let leaves = tree::iter_leaves(&root).collect::<Vec<_>>();
    assert!(leaves.iter().all(|l| l.length() <= config.max_run));
    if config.nmin() >= 2 && root.depth() > 0 {
        assert!(config.nmin().pow(root.depth() as u32 - 1) <= leaves.len());
    }

    assert_eq!(doc.text(), model);
    assert_eq!(doc.get_linelengths(), &tree::linelengths(&root)[..]);

    let runs = doc.get_styles(0, doc.length()).unwrap();
    for ((_, a), (_, b)) in runs.iter().tuple_windows() {
        assert_ne!(a, b, "neighboring runs with the same style");
    }

    for i in 0..=doc.length() {
        let (row, col) = doc.index2position(i).unwrap();
        assert_eq!(doc.position2index(row, col).unwrap(), i);
    }
}

fn splice(model: &str, i1: usize, i2: usize, text: &str) -> String {
    let mut chars = model.chars();
    let head = chars.by_ref().take(i1).collect::<String>();
    let tail = chars.skip(i2 - i1).collect::<String>();
    head + text + &tail
}

fn edit_randomly(seed: u64, steps: usize) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let pieces = ["a", "bc\n", "\n", "\td\ne", "fgh", "\n\n", "ijklmno"];

    let mut model = String::from("one\ntwo\nthree");
    let mut doc = Document::from_text(&model);
    check(&doc, &model);

    for _ in 0..steps {
        let len = doc.length();
        match rng.gen_range(0..10) {
            0..=4 => {
                let i = rng.gen_range(0..=len);
                let text = pieces[rng.gen_range(0..pieces.len())];
                doc.insert_text(i, text, &StyleMap::new()).unwrap();
                model = splice(&model, i, i, text);
            }
            5..=7 if len > 0 => {
                let i1 = rng.gen_range(0..len);
                let i2 = rng.gen_range(i1..=len.min(i1 + 8));
                let removed = doc.remove(i1, i2).unwrap();
                let expected = model.chars().skip(i1).take(i2 - i1).collect::<String>();
                assert_eq!(removed.text(), expected);
                model = splice(&model, i1, i2, "");
            }
            _ => {
                let i1 = rng.gen_range(0..=len);
                let i2 = rng.gen_range(i1..=len);
                doc.set_properties(i1, i2, &bold_patch()).unwrap();
            }
        }

        check(&doc, &model);
    }
}

#[test]
fn balanced_under_any_group_size() {
    for (&nmax, &max_run) in [2, 3, 4, 5].iter().cartesian_product([1, 3].iter()) {
        config::set(Config {
            nmax,
            max_run,
            debug_checks: true,
            ..Config::default()
        })
        .unwrap();

        let current = config::get();
        assert_eq!((current.nmax, current.max_run), (nmax, max_run));
        assert!(current.debug_checks);

        for seed in 0..3 {
            edit_randomly(seed, 300);
        }
    }

    let previous = config::set(Config::default()).unwrap();
    assert_eq!((previous.nmax, previous.max_run), (5, 3));
}
