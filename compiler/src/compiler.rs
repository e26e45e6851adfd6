//! Provides the lowering of a surveyed pattern into a runnable program:
//! a charting walk that records where every group starts and resumes, a
//! layout walk that hoists modifiers in front of what they modify, and a
//! wiring walk that fills in every jump target.

use itertools::izip;
use rexl_runtime::{Inst, Program, SetRole, REJECT};

use super::parser::{survey, ErrorKind, PatternError, Survey};

/// Per-group layout facts: the instruction index each group starts at, the
/// index of the first instruction past it, and its trailing modifier
/// (`0` when the group has none).
#[derive(Debug)]
struct GroupChart {
    starts: Vec<i32>,
    nexts: Vec<i32>,
    mods: Vec<u8>,
}

/// Returns true when `tok` closes the innermost open construct. Inside a
/// byte set only `]` closes; everything else is a member. Outside one, a
/// stray `]` is an ordinary literal.
fn closes(open: &[(usize, u8)], tok: u8) -> bool {
    match open.last() {
        Some((_, b'(')) => tok == b')',
        Some((_, b'[')) => tok == b']',
        Some((_, b'{')) => tok == b'}',
        _ => false,
    }
}

fn in_set(open: &[(usize, u8)]) -> bool {
    matches!(open.last(), Some((_, b'[')))
}

/// First walk of the lowering: records, in pre-hoist numbering, the start
/// token of every group, the token that follows it, and any `*`/`?`/`|`
/// modifier trailing its close. Groups waiting for their follower keep
/// accumulating until the next stored token arrives; groups that end the
/// pattern resume at the accept index.
fn chart_groups(pattern: &[u8], survey: &Survey) -> GroupChart {
    let mut starts = vec![REJECT; survey.groups];
    let mut nexts = vec![REJECT; survey.groups];
    let mut mods = vec![0u8; survey.groups];
    let mut open: Vec<(usize, u8)> = Vec::with_capacity(survey.groups);
    let mut pending: Vec<usize> = Vec::with_capacity(survey.groups);
    let mut nt = 0i32;
    let mut ng = 0;
    let mut i = 0;

    while i < pattern.len() {
        let tok = pattern[i];
        if !in_set(&open) && matches!(tok, b'(' | b'[' | b'{') {
            starts[ng] = nt;
            open.push((ng, tok));
            ng += 1;
        } else if closes(&open, tok) {
            let (gi, _) = open.pop().unwrap();
            if let Some(&m) = pattern.get(i + 1) {
                if matches!(m, b'*' | b'?' | b'|') {
                    mods[gi] = m;
                }
            }
            pending.push(gi);
        } else {
            if in_set(&open) || !matches!(tok, b'*' | b'?' | b'|') {
                for gi in pending.drain(..) {
                    nexts[gi] = nt;
                }
            }
            nt += 1;
        }
        i += 1;
    }

    for gi in pending.drain(..) {
        nexts[gi] = nt;
    }

    GroupChart {
        starts,
        nexts,
        mods,
    }
}

/// Second walk: writes the token bytes in execution order. A group's
/// modifier is emitted in front of the group, a single token's modifier in
/// front of the token. Hoisting an enclosing modifier pushes every start
/// inside it one slot forward, and closing such a group bumps the recorded
/// follower of every group contained in it whose follower still points
/// inside; skipping that correction would leave inner loopbacks one short.
fn hoist_tokens(pattern: &[u8], survey: &Survey, chart: &mut GroupChart) -> Vec<u8> {
    let mut toks = Vec::with_capacity(survey.tokens);
    let mut open: Vec<(usize, u8)> = Vec::with_capacity(survey.groups);
    let mut ng = 0;
    let mut hoisted = 0i32;
    let mut i = 0;

    while i < pattern.len() {
        let tok = pattern[i];
        if !in_set(&open) && matches!(tok, b'(' | b'[' | b'{') {
            chart.starts[ng] += hoisted;
            let gi = ng;
            open.push((gi, tok));
            ng += 1;
            if chart.mods[gi] != 0 {
                hoisted += 1;
                toks.push(chart.mods[gi]);
            }
        } else if closes(&open, tok) {
            let (gi, _) = open.pop().unwrap();
            if chart.mods[gi] != 0 {
                hoisted -= 1;
                let last_in_group = toks.len() as i32 - 1;
                for j in gi..ng {
                    if chart.nexts[j] < last_in_group {
                        chart.nexts[j] += 1;
                    }
                }
            }
        } else if toks.len() < survey.tokens {
            if in_set(&open) {
                toks.push(tok);
            } else {
                if let Some(&m) = pattern.get(i + 1) {
                    if matches!(m, b'*' | b'?' | b'|') {
                        toks.push(m);
                        i += 1;
                    }
                }
                if !matches!(tok, b'*' | b'?' | b'|') {
                    toks.push(tok);
                }
            }
        }
        i += 1;
    }

    toks
}

/// Accumulates the success/failure targets and set roles for the third
/// walk. `redirect` forwards a jump aimed at a slot to somewhere else:
/// a `*` group points its follower back at the hoisted branch to close the
/// loop, and a `|` group points it past the right alternand. Slots are
/// reset to themselves as the walk reaches them. `neg` is the negation
/// parity; while odd, stored pairs are swapped.
struct Wiring {
    ok: Vec<i32>,
    fail: Vec<i32>,
    role: Vec<SetRole>,
    redirect: Vec<i32>,
    neg: bool,
    at: usize,
}

impl Wiring {
    fn new(tokens: usize) -> Self {
        Self {
            ok: vec![REJECT; tokens],
            fail: vec![REJECT; tokens],
            role: vec![SetRole::None; tokens],
            redirect: (0..=tokens as i32).collect(),
            neg: false,
            at: 0,
        }
    }

    fn forwarded(&self, target: i32) -> i32 {
        if target < 0 {
            REJECT
        } else {
            self.redirect[target as usize]
        }
    }

    /// Stores a success/failure pair at the current slot, swapped while the
    /// negation parity is odd.
    fn store(&mut self, ok: i32, fail: i32) {
        let (ok, fail) = (self.forwarded(ok), self.forwarded(fail));
        let (ok, fail) = if self.neg { (fail, ok) } else { (ok, fail) };
        self.ok[self.at] = ok;
        self.fail[self.at] = fail;
    }

    /// Stores the pair for a hoisted modifier. The branch itself decides
    /// between its body and its follower; negation applies inside the
    /// construct, never to the branch.
    fn store_branch(&mut self, body: i32, after: i32) {
        self.ok[self.at] = self.forwarded(body);
        self.fail[self.at] = self.forwarded(after);
    }

    fn reset_redirect(&mut self) {
        self.redirect[self.at] = self.at as i32;
    }

    fn seal(&mut self) {
        self.reset_redirect();
        self.at += 1;
    }
}

/// Third walk: fills in every instruction's jump targets.
fn wire_jumps(pattern: &[u8], survey: &Survey, chart: &GroupChart) -> Wiring {
    let mut w = Wiring::new(survey.tokens);
    let mut open: Vec<(usize, u8)> = Vec::with_capacity(survey.groups);
    let mut ng = 0;
    let mut i = 0;

    while i < pattern.len() {
        let tok = pattern[i];
        if !in_set(&open) && matches!(tok, b'(' | b'[' | b'{') {
            let gi = ng;
            open.push((gi, tok));
            ng += 1;
            if chart.mods[gi] != 0 {
                w.store_branch(w.at as i32 + 1, chart.nexts[gi]);
                w.seal();
                match chart.mods[gi] {
                    b'*' => {
                        // the follower loops back onto the branch
                        w.redirect[chart.nexts[gi] as usize] = w.at as i32 - 1;
                    }
                    b'|' => {
                        // completing the left alternand skips the right one,
                        // which is either the group opening at the follower
                        // or a single token
                        let mut j = gi + 1;
                        while j < survey.groups && chart.starts[j] < chart.nexts[gi] {
                            j += 1;
                        }
                        let past = if j < survey.groups && chart.starts[j] == chart.nexts[gi] {
                            chart.nexts[j]
                        } else {
                            chart.nexts[gi] + 1
                        };
                        w.redirect[chart.nexts[gi] as usize] = past;
                    }
                    _ => {}
                }
            }
            if tok == b'{' {
                w.neg = !w.neg;
            }
        } else if closes(&open, tok) {
            if tok == b'}' {
                w.neg = !w.neg;
            }
            open.pop();
        } else if w.at < survey.tokens {
            if in_set(&open) {
                let gi = open.last().unwrap().0;
                if pattern.get(i + 1) == Some(&b']') {
                    w.role[w.at] = SetRole::Last;
                    w.store(chart.nexts[gi], REJECT);
                } else {
                    w.role[w.at] = SetRole::Member;
                    if w.neg {
                        // a hit rejects; the swap below recovers that from
                        // the plain member pair
                        w.store(w.at as i32 + 1, REJECT);
                    } else {
                        w.store(chart.nexts[gi], w.at as i32 + 1);
                    }
                }
                w.seal();
            } else {
                let next_tok = pattern.get(i + 1).copied().unwrap_or(0);
                if matches!(next_tok, b'*' | b'?' | b'|') {
                    w.store_branch(w.at as i32 + 1, w.at as i32 + 2);
                    w.seal();
                    i += 1;
                    match next_tok {
                        b'*' => w.store(w.at as i32 - 1, REJECT),
                        b'|' => {
                            let after = pattern.get(i + 1).copied().unwrap_or(0);
                            if matches!(after, b'(' | b'[' | b'{') {
                                w.store(chart.nexts[ng], REJECT);
                            } else {
                                w.store(w.at as i32 + 2, REJECT);
                            }
                        }
                        _ => w.store(w.at as i32 + 1, REJECT),
                    }
                    w.seal();
                } else if !matches!(tok, b'*' | b'?' | b'|') {
                    w.store(w.at as i32 + 1, REJECT);
                    w.seal();
                } else {
                    // a group modifier already hoisted at the group's open
                    w.reset_redirect();
                }
            }
        }
        i += 1;
    }

    w
}

/// Compiles a pattern into a runnable program for the `rexl-runtime`
/// crate: one validating walk to size and reject, then the three lowering
/// walks over the same pattern.
pub fn compile(pattern: &str) -> Result<Program, PatternError> {
    let bytes = pattern.as_bytes();
    let survey = survey(bytes)?;
    if survey.tokens == 0 {
        return Err(PatternError::new(ErrorKind::EmptyPattern, 0));
    }

    let mut chart = chart_groups(bytes, &survey);
    let toks = hoist_tokens(bytes, &survey, &mut chart);
    let wiring = wire_jumps(bytes, &survey, &chart);

    let insts = izip!(toks, wiring.ok, wiring.fail, wiring.role)
        .map(|(tok, ok, fail, set)| Inst {
            tok,
            ok,
            fail,
            set,
        })
        .collect();

    Ok(Program::new(insts, survey.groups))
}
