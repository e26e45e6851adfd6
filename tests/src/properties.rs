use pretty_assertions::assert_eq;
use rexl_compiler::{compile, find};
use rexl_runtime::{run, Match, Program, SetRole, REJECT};

const CORPUS: &[&str] = &[
    ".",
    ".*",
    "..",
    " (.|.)*d",
    ".* .*ad",
    "abc",
    ".*abc",
    ".((a*)|(b*))*.",
    "(abc)",
    "[abc]",
    "{abc}",
    "{[abc]}",
    "{{[abc]}}",
    "[ab][ab]",
    "{[ab][ab]}",
    "a*bc",
    "(ab)*c",
    "[ab]*c",
    "{ab}*c",
    "[a][b]*{[c]}",
    "{{a}[bcd]}",
    "a{[bcd]}e",
    "{{a}[bcd]{e}}",
    "(a(bc)?)*(d)",
    "(a(bc*)?)|d",
    "{a(bc*)?}|d",
    "{(a(bc*)?)}|d",
    "(a(bc)?)|(de)",
    "(a(z.)*)[bc]*d*",
    "(a(z.)*)[bc]*d*{e}f?g",
    "(a(z.)*)[bc]*d*{e}f?g|h",
    "({({ab}c?)*d}|(e(fg)?))",
    "({({[ab]}c?)*d}|(e(fg)?))",
    "({(a)({[bc]}d?e)*(f)}|g(hi)?)",
    "[*][*]*{[*]}",
    "[[][[]",
    ".*end{.}",
];

#[test]
fn should_keep_every_target_in_range() {
    for pattern in CORPUS {
        let program = compile(pattern).unwrap();
        let accept = program.len() as i32;

        for (id, inst) in program.as_ref().iter().enumerate() {
            assert!(
                (REJECT..=accept).contains(&inst.ok) && (REJECT..=accept).contains(&inst.fail),
                "{:?} inst {} has a target outside -1..={}",
                pattern,
                id,
                accept,
            );
            if inst.is_branch() {
                assert_eq!(SetRole::None, inst.set);
            }
        }
    }
}

#[test]
fn should_treat_double_negation_as_identity() {
    let cases = vec![
        ("abc", vec!["abc", "abd", "zabc"]),
        ("[ab]c", vec!["ac", "bc", "zc"]),
        ("a*b", vec!["aab", "b", "ax"]),
        ("(ab)*c", vec!["ababc", "c ", "abd"]),
    ];

    for (pattern, inputs) in cases {
        let wrapped = format!("{{{{{}}}}}", pattern);
        for input in inputs {
            assert_eq!(
                find(pattern, input).unwrap(),
                find(&wrapped, input).unwrap(),
                "double negation of {:?} diverged on {:?}",
                pattern,
                input,
            );
        }
    }
}

#[test]
fn should_honor_set_literal_duality() {
    for input in ["xy", "zy", "yy"] {
        assert_eq!(
            find("xy", input).unwrap(),
            find("[x]y", input).unwrap(),
            "singleton set diverged from its literal on {:?}",
            input,
        );
        assert_eq!(
            find("{x}y", input).unwrap(),
            find("{[x]}y", input).unwrap(),
            "negated singleton set diverged from its literal on {:?}",
            input,
        );
    }
}

#[test]
fn should_terminate_on_epsilon_cycles() {
    let cases = vec![
        ("(a*)*b", "aaab", Some(Match::new(0, 4))),
        ("(a*)*b", "b", Some(Match::new(0, 1))),
        ("(a*)*b", "aaax", None),
        ("((ab)*c)*d", "ababcd", Some(Match::new(0, 6))),
        ("((ab)*c)*d", "d", Some(Match::new(0, 1))),
        ("((ab)*c)*d", "ababab", None),
    ];

    for (test_id, (pattern, input, expected)) in cases.into_iter().enumerate() {
        assert_eq!((test_id, expected), (test_id, find(pattern, input).unwrap()));
    }
}

/// Walks the compiled program breadth-first from instruction 0 to the
/// accept index, choosing a byte for every comparison taken: the token
/// itself (or a stand-in for `.`) to follow the success edge, and a byte
/// that cannot equal the token to follow the failure edge. Interior set
/// elements fail without consuming. The walk returns the bytes consumed by
/// the first accepting path found, if any.
fn reconstruct(program: &Program) -> Option<String> {
    use std::collections::VecDeque;

    let accept = program.len() as i32;
    let insts = program.as_ref();
    let mut seen = vec![false; program.len()];
    let mut queue = VecDeque::new();
    queue.push_back((0i32, String::new()));

    while let Some((at, input)) = queue.pop_front() {
        if at == accept {
            return Some(input);
        }
        if at < 0 {
            continue;
        }
        let idx = at as usize;
        if seen[idx] {
            continue;
        }
        seen[idx] = true;

        let inst = &insts[idx];
        if inst.is_branch() {
            queue.push_back((inst.ok, input.clone()));
            queue.push_back((inst.fail, input));
            continue;
        }

        let hit = if inst.tok == b'.' && inst.set == SetRole::None {
            'x'
        } else {
            inst.tok as char
        };
        let mut on_ok = input.clone();
        on_ok.push(hit);
        queue.push_back((inst.ok, on_ok));

        if inst.set == SetRole::Member {
            queue.push_back((inst.fail, input));
        } else {
            let miss = if inst.tok == b'.' {
                // only the end of input or a NUL byte fails `.`
                '\0'
            } else if inst.tok == b'z' {
                'q'
            } else {
                'z'
            };
            let mut on_fail = input;
            on_fail.push(miss);
            queue.push_back((inst.fail, on_fail));
        }
    }

    None
}

#[test]
fn should_match_a_reconstructed_input() {
    for pattern in CORPUS {
        let program = compile(pattern).unwrap();
        let input = reconstruct(&program)
            .unwrap_or_else(|| panic!("no accepting walk through {:?}", pattern));
        if input.is_empty() {
            // zero-width accepts need no input, which the matcher refuses
            continue;
        }
        assert!(
            run(&program, &input).is_some(),
            "pattern {:?} rejected its reconstruction {:?}",
            pattern,
            input,
        );
    }
}
