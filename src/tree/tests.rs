use std::sync::Arc;

use itertools::Itertools;
use maplit::btreemap;
use rand::{rngs::SmallRng, Rng, SeedableRng};

use super::*;
use crate::config;
use crate::style::{Style, StyleMap};
use crate::texel::{self, Channel, ContainerKind, Fraction, Kind, Texel};
use crate::Error;

fn plain() -> Style {
    Style::default()
}

fn bold_patch() -> StyleMap {
    btreemap! { "bold".to_string() => true.into() }
}

fn bold() -> Style {
    plain().update(&bold_patch())
}

// A tree with one leaf per character, so that it's as deep as possible for its length
fn chopped(s: &str, style: &Style) -> Texel {
    let leaves = s
        .chars()
        .flat_map(|c| texel::from_text(&c.to_string(), style))
        .collect();
    grouped(leaves)
}

fn leaf_count(t: &Texel) -> usize {
    iter_leaves(t).count()
}

fn assert_valid(t: &Texel) {
    if let Err(e) = validate(t) {
        panic!("{}\n{}", e, dump(t));
    }
}

#[test]
fn grouped_is_balanced() {
    let nmax = config::get().nmax;

    for n in 0..=300 {
        let t = chopped(&"x".repeat(n), &plain());
        assert_eq!(t.length(), n);
        assert_valid(&t);

        match n {
            0 => assert!(t.as_group().map(|g| g.is_empty()).unwrap_or(false)),
            1 => assert!(t.is_leaf()),
            _ if n <= nmax => assert_eq!(t.depth(), 1),
            _ => assert!(t.depth() >= 2),
        }
    }
}

#[test]
fn groups_sizes_differ_by_one() {
    let nmax = config::get().nmax;
    let leaves: Vec<_> = (0..(3 * nmax + 2))
        .map(|_| Texel::text("a", plain()))
        .collect();

    let sizes = groups(leaves)
        .iter()
        .map(|g| g.as_group().unwrap().len())
        .collect::<Vec<_>>();

    assert_eq!(sizes.len(), 4);
    assert_eq!(sizes.iter().sum::<usize>(), 3 * nmax + 2);
    let (min, max) = sizes.iter().minmax().into_option().unwrap();
    assert!(max - min <= 1);
}

#[test]
fn join_mismatched_depths() {
    let deep = chopped(&"d".repeat(400), &plain());
    let shallow = chopped("sss", &plain());
    assert!(deep.depth() > shallow.depth());

    let cases = vec![
        (as_list(&deep), as_list(&shallow)),
        (as_list(&shallow), as_list(&deep)),
        (vec![Texel::text("x", plain())], as_list(&deep)),
        (as_list(&deep), vec![Texel::text("x", plain())]),
    ];

    for (a, b) in cases {
        let expected = grouped(a.clone()).get_text() + &grouped(b.clone()).get_text();

        let joined = join(vec![a, b]);
        assert!(is_homogeneous(&joined));
        let t = grouped(joined);
        assert_eq!(t.get_text(), expected);
        assert_valid(&t);
    }
}

#[test]
fn split_preserves_content() {
    let t = chopped("Hello,\nworld!\tThis is a\nsmall test", &plain());
    let text = t.get_text();

    for i in 0..=t.length() {
        let (a, b) = split(&t, i).unwrap();
        assert_eq!(a.length(), i);
        assert_eq!(a.length() + b.length(), t.length());
        assert_eq!(a.get_text() + &b.get_text(), text);
        assert_valid(&a);
        assert_valid(&b);
    }

    assert_eq!(
        split(&t, t.length() + 1).unwrap_err(),
        Error::OutOfRange {
            idx: t.length() + 1,
            len: t.length()
        }
    );
}

#[test]
fn takeout_and_reinsert() {
    let t = chopped("abc\ndefghijklmnop\tqrstuvwxyz0123456789", &plain());
    let text: Vec<char> = t.get_text().chars().collect();
    let len = t.length();

    for (i1, i2) in (0..=len).cartesian_product(0..=len) {
        if i1 > i2 {
            assert!(takeout(&t, i1, i2).is_err());
            continue;
        }

        let (rest, part) = takeout(&t, i1, i2).unwrap();
        assert!(is_homogeneous(&rest));
        assert!(is_homogeneous(&part));

        let (rest, part) = (grouped(rest), grouped(part));
        assert_valid(&rest);
        assert_valid(&part);
        assert_eq!(part.length(), i2 - i1);
        assert_eq!(part.get_text(), text[i1..i2].iter().collect::<String>());

        let restored = grouped(insert(&rest, i1, as_list(&part)).unwrap());
        assert_eq!(restored.get_text(), text.iter().collect::<String>());
        assert_valid(&restored);
    }
}

#[test]
fn takeout_from_single_leaf() {
    let t = Texel::text("0123456789", plain());

    let (rest, part) = takeout(&t, 3, 7).unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].get_text(), "012789");
    assert_eq!(part[0].get_text(), "3456");

    assert_eq!(copy(&t, 0, 10).unwrap().len(), 1);
    assert!(Texel::ptr_eq(&copy(&t, 0, 10).unwrap()[0], &t));
    assert!(remove(&t, 0, 10).unwrap().is_empty());
}

#[test]
fn insert_remove_inverse() {
    let mut rng = SmallRng::seed_from_u64(0x7e7e1);
    let alphabet: Vec<char> = "abcdef\n\t xyz".chars().collect();

    let mut t = chopped("The quick brown fox\njumps over\tthe lazy dog", &plain());
    for _ in 0..300 {
        let original = t.get_text();

        let n = rng.gen_range(1..40);
        let s: String = (0..n)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
            .collect();
        let stuff = texel::from_text(&s, &bold());
        let stuff_len: usize = stuff.iter().map(Texel::length).sum();

        let i = rng.gen_range(0..=t.length());
        let inserted = grouped(insert(&t, i, stuff).unwrap());
        assert_valid(&inserted);
        assert_eq!(inserted.length(), original.chars().count() + stuff_len);

        let removed = grouped(remove(&inserted, i, i + stuff_len).unwrap());
        assert_valid(&removed);
        assert_eq!(removed.get_text(), original);

        // Keep the inserted version around, so the tree grows over time
        t = inserted;
    }
}

#[test]
fn insert_out_of_range() {
    let t = chopped("abc", &plain());
    assert_eq!(
        insert(&t, 4, vec![Texel::text("x", plain())]).unwrap_err(),
        Error::OutOfRange { idx: 4, len: 3 }
    );
}

#[test]
fn insert_each_position_then_remove_heals_back() {
    let base = Texel::text("0123456789", plain());

    for i in 0..=10 {
        let t = grouped(insert(&base, i, vec![Texel::text("x", plain())]).unwrap());
        let t = heal(&t, &[i, i + 1]).unwrap();
        assert!(t.as_text().is_some(), "not fused: {:?}", t);
        assert_eq!(t.length(), 11);

        let t = grouped(remove(&t, i, i + 1).unwrap());
        let t = heal(&t, &[i]).unwrap();
        assert_eq!(t.get_text(), "0123456789");
        assert!(t.as_text().is_some());
    }
}

#[test]
fn heal_is_idempotent_and_safe() {
    let mut rng = SmallRng::seed_from_u64(42);
    let styles = [plain(), bold()];

    let leaves = (0..120)
        .map(|i| {
            let style = styles[rng.gen_range(0..2)].clone();
            Texel::text(&format!("{}", i % 10), style)
        })
        .collect();
    let t = grouped(leaves);

    for i in 0..=t.length() {
        let once = heal(&t, &[i]).unwrap();
        let twice = heal(&once, &[i]).unwrap();

        assert_eq!(once.get_text(), t.get_text());
        assert_eq!(once.length(), t.length());
        assert_eq!(twice.get_text(), once.get_text());
        assert_eq!(leaf_count(&twice), leaf_count(&once));
        assert_eq!(
            get_styles(&once, 0, once.length()).unwrap(),
            get_styles(&t, 0, t.length()).unwrap()
        );
        assert_valid(&once);
    }
}

#[test]
fn heal_respects_run_limit() {
    let max_run = config::get().max_run;
    let full = Texel::text(&"a".repeat(max_run), plain());
    let t = grouped(vec![full, Texel::text("b", plain())]);

    let healed = heal(&t, &[max_run]).unwrap();
    assert_eq!(leaf_count(&healed), 2);
}

#[test]
fn heal_skips_glyphs_and_mismatched_styles() {
    let t = grouped(vec![
        Texel::text("ab", plain()),
        Texel::newline(plain(), plain()),
        Texel::text("cd", plain()),
        Texel::text("ef", bold()),
    ]);

    let healed = heal(&t, &[2, 3, 5]).unwrap();
    assert_eq!(leaf_count(&healed), 4);
}

#[test]
fn set_properties_splits_runs() {
    let base = plain();
    let t = Texel::text("0123456789", base.clone());

    let t = set_properties(&t, 3, 5, &bold_patch()).unwrap();
    assert_eq!(
        get_styles(&t, 0, 10).unwrap(),
        vec![(3, base.clone()), (2, bold()), (5, base)]
    );
    assert_eq!(t.get_text(), "0123456789");
    assert_valid(&t);
}

#[test]
fn set_properties_fuses_equal_runs() {
    let t = grouped(vec![
        Texel::text("01234", plain()),
        Texel::text("56789", bold()),
    ]);

    let t = set_properties(&t, 0, 10, &bold_patch()).unwrap();
    assert_eq!(get_styles(&t, 0, 10).unwrap(), vec![(10, bold())]);
    assert!(t.as_text().is_some(), "not fused: {:?}", t);
}

#[test]
fn newline_keeps_paragraph_style() {
    let par = Style::intern(btreemap! { "align".to_string() => "center".into() });
    let t = grouped(vec![
        Texel::text("ab", plain()),
        Texel::newline(plain(), par.clone()),
    ]);

    let t = set_styles(&t, 0, &[(3, bold())]).unwrap();
    let (nl, _) = leaf_at(&t, 2).unwrap();
    let g = nl.as_glyph().unwrap();
    assert_eq!(g.style(), &bold());
    assert_eq!(g.paragraph_style(), Some(&par));
}

#[test]
fn get_styles_never_repeats_a_style() {
    let mut rng = SmallRng::seed_from_u64(7);
    let styles = [plain(), bold()];

    let leaves = (0..200)
        .map(|_| Texel::text("xy", styles[rng.gen_range(0..2)].clone()))
        .collect();
    let t = grouped(leaves);

    for _ in 0..100 {
        let i1 = rng.gen_range(0..=t.length());
        let i2 = rng.gen_range(i1..=t.length());

        let runs = get_styles(&t, i1, i2).unwrap();
        assert_eq!(runs.iter().map(|(n, _)| n).sum::<usize>(), i2 - i1);
        assert!(runs.iter().all(|(n, _)| *n != 0));
        for ((_, a), (_, b)) in runs.iter().tuple_windows() {
            assert!(!Style::same(a, b));
        }
    }
}

#[test]
fn set_styles_round_trip() {
    let mut rng = SmallRng::seed_from_u64(99);
    let styles = [plain(), bold()];

    let t = chopped("a fairly ordinary line\nand\tanother", &plain());
    let len = t.length();

    for _ in 0..50 {
        let i = rng.gen_range(0..len);
        let mut runs = Vec::new();
        let mut pos = i;
        while pos < len {
            let n = rng.gen_range(1..=(len - pos).min(5));
            runs.push((n, styles[rng.gen_range(0..2)].clone()));
            pos += n;
        }

        let restyled = set_styles(&t, i, &runs).unwrap();
        assert_valid(&restyled);
        assert_eq!(restyled.get_text(), t.get_text());

        // Reading back gives the same runs, modulo fusing
        let expected = {
            let mut fused: Vec<(usize, Style)> = Vec::new();
            for (n, s) in runs {
                match fused.last_mut() {
                    Some((m, last)) if Style::same(last, &s) => *m += n,
                    _ => fused.push((n, s)),
                }
            }
            fused
        };
        assert_eq!(get_styles(&restyled, i, len).unwrap(), expected);
    }

    assert!(set_styles(&t, len - 1, &[(2, bold())]).is_err());
}

#[test]
fn set_styles_with_huge_runs() {
    let t = Texel::text("abc", plain());

    assert_eq!(
        set_styles(&t, 1, &[(usize::MAX, bold())]).unwrap_err(),
        Error::OutOfRange {
            idx: usize::MAX,
            len: 3
        }
    );
    assert!(set_styles(&t, 0, &[(1, bold()), (usize::MAX, plain())]).is_err());
    assert!(set_properties(&t, 1, usize::MAX, &bold_patch()).is_err());
}

#[test]
fn get_style_at_the_edges() {
    let t = grouped(vec![
        Texel::text("ab", plain()),
        Texel::text("cd", bold()),
    ]);

    assert_eq!(get_style(&t, 0).unwrap(), plain());
    assert_eq!(get_style(&t, 2).unwrap(), bold());
    assert_eq!(get_style(&t, 4).unwrap(), bold());
    assert!(get_style(&t, 5).is_err());

    let empty = grouped(Vec::new());
    assert_eq!(
        get_style(&empty, 0).unwrap_err(),
        Error::OutOfRange { idx: 0, len: 0 }
    );
}

#[test]
fn weights_translate_lines() {
    let s = "ab\ncd\n\nef";
    for t in vec![chopped(s, &plain()), grouped(texel::from_text(s, &plain()))] {
        assert_eq!(t.lines(), 3);
        assert_eq!(find_weight(&t, 0, Channel::Lines).unwrap(), 0);
        assert_eq!(find_weight(&t, 1, Channel::Lines).unwrap(), 3);
        assert_eq!(find_weight(&t, 2, Channel::Lines).unwrap(), 6);
        assert_eq!(find_weight(&t, 3, Channel::Lines).unwrap(), 7);
        assert_eq!(
            find_weight(&t, 4, Channel::Lines).unwrap_err(),
            Error::OutOfRange { idx: 4, len: 3 }
        );

        let chars: Vec<char> = s.chars().collect();
        for i in 0..=t.length() {
            let lines = chars[..i].iter().filter(|&&c| c == '\n').count();
            assert_eq!(get_weight(&t, Channel::Lines, i).unwrap(), lines);
            assert_eq!(get_weight(&t, Channel::Length, i).unwrap(), i);
            assert_eq!(find_weight(&t, i, Channel::Length).unwrap(), i);
        }

        assert_eq!(linelengths(&t), vec![3, 3, 1, 2]);
    }
}

#[test]
fn find_weight_is_smallest_index() {
    let t = chopped(&"line\n".repeat(100), &plain());

    for w in 0..=t.lines() {
        let i = find_weight(&t, w, Channel::Lines).unwrap();
        assert!(get_weight(&t, Channel::Lines, i).unwrap() >= w);
        if i > 0 {
            assert!(get_weight(&t, Channel::Lines, i - 1).unwrap() < w);
        }
    }
}

#[test]
fn leaves_and_dump() {
    let t = chopped("ab\tc", &plain());
    let leaves: Vec<_> = iter_leaves(&t).map(|l| l.get_text()).collect();
    assert_eq!(leaves, ["a", "b", "\t", "c"]);

    let (leaf, start) = leaf_at(&t, 2).unwrap();
    assert_eq!(start, 2);
    assert!(matches!(leaf.kind(), Kind::Glyph(_)));
    assert!(leaf_at(&t, 4).is_err());

    let dumped = dump(&t);
    assert!(dumped.starts_with("Group[4]"));
    assert_eq!(dumped.lines().count(), 5);
    assert!(dumped.contains("Tabulator"));
}

#[test]
fn validate_rejects_underfull_groups() {
    let leaf = Texel::text("a", plain());
    let lonely = Texel::group(vec![leaf.clone()]);
    let t = Texel::group(vec![lonely.clone(), lonely]);

    assert!(!is_efficient(&t));
    assert!(matches!(validate(&t), Err(Error::Conformance { .. })));
    assert!(!is_homogeneous(&[leaf, Texel::group(Vec::new())]));
}

//////////////////////////////////////////
// Containers                           //
//////////////////////////////////////////

fn fraction(den: &str, nom: &str) -> Texel {
    let slot = |s: &str| grouped(texel::from_text(s, &plain()));
    Fraction::build(slot(den), slot(nom), &plain()).unwrap()
}

#[test]
fn takeout_confined_to_slots() {
    let f = fraction("a", "b");
    assert_eq!(f.get_text(), "(a/b)");

    assert_eq!(
        takeout(&f, 1, 4).unwrap_err(),
        Error::Boundary { start: 1, end: 4 }
    );
    assert!(takeout(&f, 0, 1).is_err());

    let (rest, part) = takeout(&f, 1, 2).unwrap();
    assert_eq!(grouped(rest).get_text(), "(/b)");
    assert_eq!(grouped(part).get_text(), "a");

    // The whole container can always be removed
    let (rest, part) = takeout(&f, 0, 5).unwrap();
    assert!(rest.is_empty());
    assert!(Texel::ptr_eq(&part[0], &f));
}

#[test]
fn boundary_errors_are_absolute() {
    let t = grouped(vec![
        Texel::text("xy", plain()),
        fraction("a", "b"),
        Texel::text("z", bold()),
    ]);
    assert_eq!(t.get_text(), "xy(a/b)z");

    assert_eq!(
        takeout(&t, 3, 6).unwrap_err(),
        Error::Boundary { start: 3, end: 6 }
    );
    assert!(split(&t, 4).is_err());

    let rest = grouped(remove(&t, 2, 7).unwrap());
    assert_eq!(rest.get_text(), "xyz");
}

#[test]
fn insert_into_slots() {
    let f = fraction("a", "b");

    let t = grouped(insert(&f, 2, texel::from_text("cd", &plain())).unwrap());
    assert_eq!(t.get_text(), "(acd/b)");
    let t = grouped(insert(&t, 5, texel::from_text("e", &plain())).unwrap());
    assert_eq!(t.get_text(), "(acd/eb)");
    let t = grouped(insert(&t, 0, texel::from_text("<", &plain())).unwrap());
    assert_eq!(t.get_text(), "<(acd/eb)");
    assert_valid(&t);

    let empty = Fraction::build(grouped(Vec::new()), Texel::text("b", plain()), &plain()).unwrap();
    assert_eq!(empty.get_text(), "(/b)");
    let filled = grouped(insert(&empty, 1, texel::from_text("q", &plain())).unwrap());
    assert_eq!(filled.get_text(), "(q/b)");
}

#[test]
fn heal_inside_slots() {
    let f = fraction("ab", "c");
    let t = grouped(insert(&f, 2, vec![Texel::text("x", plain())]).unwrap());
    let t = heal(&t, &[2, 3]).unwrap();

    let c = t.as_container().unwrap();
    assert!(c.get_content()[0].as_text().is_some());
    assert_eq!(t.get_text(), "(axb/c)");
}

#[test]
fn styles_over_containers() {
    let t = grouped(vec![Texel::text("xy", plain()), fraction("ab", "c")]);

    let styled = set_properties(&t, 1, 8, &bold_patch()).unwrap();
    assert_eq!(styled.get_text(), "xy(ab/c)");
    assert_eq!(
        get_styles(&styled, 0, 8).unwrap(),
        vec![(1, plain()), (7, bold())]
    );

    let (_, c) = split(&styled, 2).unwrap();
    assert_eq!(c.as_container().unwrap().style(), &bold());
    assert_valid(&styled);
}

#[test]
fn container_trees_conform() {
    let t = grouped(vec![
        Texel::text("xy", plain()),
        Texel::newline(plain(), plain()),
        fraction("ab", ""),
        Texel::tab(plain()),
        fraction("c", "d"),
    ]);

    conformance(&t).unwrap();
    check_kind(Arc::new(Fraction)).unwrap();
    check_kind(Arc::new(texel::Cell)).unwrap();
}

#[derive(Debug)]
struct Triple;

impl ContainerKind for Triple {
    fn name(&self) -> &str {
        "triple"
    }

    fn slot_count(&self) -> usize {
        3
    }
}

#[test]
fn register_custom_kind() {
    texel::register(Arc::new(Triple)).unwrap();
    let kind = texel::lookup("triple").unwrap();
    assert_eq!(kind.slot_count(), 3);
    assert_eq!(kind.separators(), vec!['\u{fffc}'; 4]);
}

#[test]
fn many_inserts_stay_balanced() {
    let mut t = grouped(Vec::new());
    for i in 0..10_000 {
        let c = std::char::from_digit(i % 10, 10).unwrap();
        let stuff = texel::from_text(&c.to_string(), &plain());
        t = grouped(insert(&t, 0, stuff).unwrap());
    }

    assert_eq!(t.length(), 10_000);
    assert_eq!(leaf_count(&t), 10_000);
    assert!(is_efficient(&t));
    assert!(t.depth() <= 6, "depth {} is too large", t.depth());
    assert!(t.get_text().starts_with("9876543210"));
}

#[test]
fn many_healed_inserts_stay_compact() {
    let max_run = config::get().max_run;

    let mut t = grouped(Vec::new());
    for _ in 0..10_000 {
        let inserted = grouped(insert(&t, 0, vec![Texel::text("a", plain())]).unwrap());
        t = heal(&inserted, &[1]).unwrap();
    }

    assert_eq!(t.length(), 10_000);
    assert_eq!(leaf_count(&t), (10_000 + max_run - 1) / max_run);
    assert_valid(&t);
}
