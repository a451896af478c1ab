//! Probe for the alignment lattice: fill timing checked against a full-table
//! DP, forward-only direction asymmetry, and count feedback totals.
//!
//! Progress goes to stderr; stdout gets one CSV row per run.

use std::env;
use std::fmt::Display;
use std::time::Instant;

use name_lattice::{
    AlignmentLattice, AlignmentStrategy, DefaultCosts, Edit, EditCostModel, EditTable, NameScorer,
    Sequence, Token,
};
use sysinfo::{get_current_pid, ProcessRefreshKind, System};

fn main() {
    let options = match Options::parse(env::args().skip(1)) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("score_probe: {err}");
            Options::print_help();
            std::process::exit(2);
        }
    };

    let mut rss = RssSampler::new();
    let mut rows = Vec::new();

    eprintln!("[1/3] lattice fill vs. full-table min cost");
    rows.extend(run_fill(&options, &mut rss));
    eprintln!("[2/3] forward vs. reversed scoring on {} pairs", options.pairs);
    rows.push(run_asymmetry(&options, &mut rss));
    eprintln!("[3/3] count feedback on {} pairs", options.pairs);
    rows.push(run_training(&options, &mut rss));

    let mismatches = rows.iter().filter(|r| r.check.is_mismatch()).count();
    if mismatches == 0 {
        eprintln!("all checked rows agree");
    } else {
        eprintln!("{mismatches} row(s) disagree");
    }

    print_csv(&rows);
    if mismatches > 0 {
        std::process::exit(1);
    }
}

struct Options {
    verify_limit: usize,
    pairs: usize,
}

impl Options {
    fn parse<I, T>(mut args: I) -> Result<Self, String>
    where
        I: Iterator<Item = T>,
        T: Into<String>,
    {
        let mut options = Options {
            verify_limit: 512,
            pairs: 20_000,
        };

        while let Some(arg) = args.next() {
            let arg = arg.into();
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
                None => (arg.clone(), None),
            };
            if flag == "--help" || flag == "-h" {
                Options::print_help();
                std::process::exit(0);
            }
            let slot = match flag.as_str() {
                "--verify-limit" => &mut options.verify_limit,
                "--pairs" => &mut options.pairs,
                _ => return Err(format!("unrecognized argument '{flag}'")),
            };
            let value = match inline {
                Some(value) => value,
                None => args
                    .next()
                    .map(Into::into)
                    .ok_or_else(|| format!("missing value after {flag}"))?,
            };
            *slot = value
                .parse()
                .map_err(|_| format!("{flag} takes a non-negative integer"))?;
        }
        Ok(options)
    }

    fn print_help() {
        println!(
            "\
Usage: cargo run --bin score_probe [-- <options>]

Options:
  --verify-limit <N>   Longest name checked against the full-table DP (default: 512)
  --pairs <N>          Generated pairs for the asymmetry and training runs (default: 20000)
  -h, --help           Print this help message
"
        );
    }
}

/// Outcome of the independent check attached to a row.
#[derive(Default)]
enum Check {
    #[default]
    Skipped,
    Agrees,
    Disagrees(String),
}

impl Check {
    fn is_mismatch(&self) -> bool {
        matches!(self, Check::Disagrees(_))
    }

    fn mark(&self) -> &'static str {
        match self {
            Check::Skipped => "skipped",
            Check::Agrees => "ok",
            Check::Disagrees(_) => "MISMATCH",
        }
    }
}

/// One CSV row; columns a scenario does not produce stay empty.
#[derive(Default)]
struct ProbeRow {
    scenario: &'static str,
    pairs: usize,
    name_len: Option<usize>,
    terminal_cost: Option<u64>,
    path_len: Option<usize>,
    asymmetric_pairs: Option<usize>,
    edits_recorded: Option<usize>,
    distinct_edits: Option<usize>,
    wall_s: f64,
    rss_delta_kib: u64,
    check: Check,
}

struct RssSampler {
    sys: System,
}

impl RssSampler {
    fn new() -> Self {
        Self { sys: System::new() }
    }

    fn kib(&mut self) -> u64 {
        self.sys.refresh_processes_specifics(ProcessRefreshKind::new());
        match get_current_pid().ok().and_then(|pid| self.sys.process(pid)) {
            // sysinfo 0.30 reports process memory in bytes.
            Some(process) => process.memory() / 1024,
            None => 0,
        }
    }

    /// Run `work`, returning its output, wall seconds and RSS growth in KiB.
    fn timed<T>(&mut self, work: impl FnOnce() -> T) -> (T, f64, u64) {
        let before = self.kib();
        let start = Instant::now();
        let out = work();
        let wall_s = start.elapsed().as_secs_f64();
        (out, wall_s, self.kib().saturating_sub(before))
    }
}

fn probe_model() -> EditTable {
    EditTable::new(DefaultCosts {
        self_match: 1,
        substitution: 3,
        insertion: 4,
        deletion: 4,
    })
}

fn run_fill(options: &Options, rss: &mut RssSampler) -> Vec<ProbeRow> {
    const LENGTHS: &[usize] = &[8, 16, 32, 64, 128, 256, 512, 1024, 2048];
    let model = probe_model();
    let mut rows = Vec::with_capacity(LENGTHS.len());

    for &len in LENGTHS {
        let s = deterministic_name(len, 0);
        let t = deterministic_name(len, 1);
        let ((cost, path_len), wall_s, rss_delta_kib) = rss.timed(|| {
            let mut lattice = AlignmentLattice::new(s.clone(), t.clone());
            let filled = lattice.fill(&model);
            (filled.terminal_cost(), filled.best_edits().len())
        });

        let check = if len > options.verify_limit {
            Check::Skipped
        } else {
            let expected = full_min_cost(&s, &t, &model);
            if expected == cost {
                Check::Agrees
            } else {
                Check::Disagrees(format!("full-table cost {expected}"))
            }
        };
        eprintln!(
            "      len={len:<5} cost={cost:<6} path_len={path_len:<5} {wall_s:.3}s {}",
            check.mark()
        );

        rows.push(ProbeRow {
            scenario: "lattice_fill",
            pairs: 1,
            name_len: Some(len),
            terminal_cost: Some(cost),
            path_len: Some(path_len),
            wall_s,
            rss_delta_kib,
            check,
            ..ProbeRow::default()
        });
    }
    rows
}

fn run_asymmetry(options: &Options, rss: &mut RssSampler) -> ProbeRow {
    let forward = NameScorer::new(probe_model());
    let exact = NameScorer::builder(probe_model())
        .with_strategy(AlignmentStrategy::ExactBidirectional)
        .build()
        .expect("default smoothing is valid");
    let pairs = generated_pairs(options.pairs);

    let ((asymmetric, exact_asymmetric), wall_s, rss_delta_kib) = rss.timed(|| {
        let mut asymmetric = 0usize;
        let mut exact_asymmetric = 0usize;
        for (s, t) in &pairs {
            if forward.score_pair(s, t) != forward.score_pair(t, s) {
                asymmetric += 1;
            }
            if exact.score_pair(s, t) != exact.score_pair(t, s) {
                exact_asymmetric += 1;
            }
        }
        (asymmetric, exact_asymmetric)
    });

    let check = if exact_asymmetric == 0 {
        Check::Agrees
    } else {
        Check::Disagrees(format!("exact strategy asymmetric on {exact_asymmetric} pairs"))
    };
    eprintln!(
        "      forward-only asymmetric={asymmetric} {wall_s:.3}s {}",
        check.mark()
    );

    ProbeRow {
        scenario: "direction_asymmetry",
        pairs: pairs.len(),
        asymmetric_pairs: Some(asymmetric),
        wall_s,
        rss_delta_kib,
        check,
        ..ProbeRow::default()
    }
}

/// Trains the same corpus once through `train_batch` and once through
/// `retrain_pass` over kept lattices; both must record identical counts.
fn run_training(options: &Options, rss: &mut RssSampler) -> ProbeRow {
    let scorer = NameScorer::builder(probe_model())
        .with_strategy(AlignmentStrategy::ExactBidirectional)
        .build()
        .expect("default smoothing is valid");
    let pairs = generated_pairs(options.pairs);
    let mut lattices: Vec<AlignmentLattice> = pairs
        .iter()
        .map(|(s, t)| AlignmentLattice::new(s.clone(), t.clone()))
        .collect();

    let ((recorded, batch_counts, retrained), wall_s, rss_delta_kib) = rss.timed(|| {
        let recorded = scorer.train_batch(&pairs);
        let batch_counts = scorer.model().take_counts();
        let retrained = scorer.retrain_pass(&mut lattices);
        (recorded, batch_counts, retrained)
    });

    let min_len: usize = pairs.iter().map(|(s, t)| s.len().max(t.len())).sum();
    let max_len: usize = pairs.iter().map(|(s, t)| s.len() + t.len()).sum();
    let check = if !(min_len..=max_len).contains(&recorded) {
        Check::Disagrees(format!("edits outside {min_len}..={max_len}"))
    } else if retrained != recorded || scorer.model().counts() != batch_counts {
        Check::Disagrees(format!("retrain_pass recorded {retrained}"))
    } else {
        Check::Agrees
    };
    eprintln!(
        "      edits={recorded} distinct={} {wall_s:.3}s {}",
        batch_counts.len(),
        check.mark()
    );

    ProbeRow {
        scenario: "training_feedback",
        pairs: pairs.len(),
        edits_recorded: Some(recorded),
        distinct_edits: Some(batch_counts.len()),
        wall_s,
        rss_delta_kib,
        check,
        ..ProbeRow::default()
    }
}

fn cell<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn print_csv(rows: &[ProbeRow]) {
    println!(
        "scenario,pairs,name_len,terminal_cost,path_len,asymmetric_pairs,\
         edits_recorded,distinct_edits,wall_s,rss_delta_kib,check,note"
    );
    for row in rows {
        let note = match &row.check {
            Check::Disagrees(why) => why.replace(',', ";"),
            _ => String::new(),
        };
        println!(
            "{},{},{},{},{},{},{},{},{:.3},{},{},{}",
            row.scenario,
            row.pairs,
            cell(row.name_len),
            cell(row.terminal_cost),
            cell(row.path_len),
            cell(row.asymmetric_pairs),
            cell(row.edits_recorded),
            cell(row.distinct_edits),
            row.wall_s,
            row.rss_delta_kib,
            row.check.mark(),
            note
        );
    }
}

/// Letter-like tokens cycling through a 26-symbol alphabet with a per-seed drift.
fn deterministic_name(len: usize, seed: usize) -> Sequence {
    (0..len)
        .map(|i| {
            let v = (i * 7 + seed * 13 + (i / 3) * seed) % 26;
            Token(u32::from(b'a') + v as u32)
        })
        .collect()
}

/// Short name pairs of varying length, each target a perturbation of its source.
fn generated_pairs(count: usize) -> Vec<(Sequence, Sequence)> {
    (0..count)
        .map(|i| {
            let len_s = 3 + i % 9;
            let len_t = 3 + (i / 9) % 9;
            let s = deterministic_name(len_s, i % 5);
            let mut t = deterministic_name(len_t, i % 5);
            if !t.is_empty() {
                let at = i % t.len();
                t[at] = Token(u32::from(b'a') + (i % 26) as u32);
            }
            (s, t)
        })
        .collect()
}

fn full_min_cost<M: EditCostModel>(s: &[Token], t: &[Token], model: &M) -> u64 {
    let n = s.len();
    let m = t.len();
    let mut dp = vec![vec![0u64; m + 1]; n + 1];
    for i in 1..=n {
        dp[i][0] = dp[i - 1][0] + u64::from(model.cost(Edit::deletion(s[i - 1])));
    }
    for j in 1..=m {
        dp[0][j] = dp[0][j - 1] + u64::from(model.cost(Edit::insertion(t[j - 1])));
    }
    for i in 1..=n {
        for j in 1..=m {
            let diag = dp[i - 1][j - 1] + u64::from(model.cost(Edit::new(s[i - 1], t[j - 1])));
            let up = dp[i - 1][j] + u64::from(model.cost(Edit::deletion(s[i - 1])));
            let left = dp[i][j - 1] + u64::from(model.cost(Edit::insertion(t[j - 1])));
            dp[i][j] = diag.min(up).min(left);
        }
    }
    dp[n][m]
}
