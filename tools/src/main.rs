//! proof-runner: headless runner for proof-of-gameplay.
//!
//! Usage:
//!   proof-runner play   --variant lemonade --seed alice [--player NAME] [--policy-seed 7] [--rounds 30] [--out game.json]
//!   proof-runner verify --in game.json [--db ledger.db] [--rules data/lemonade.json]
//!   proof-runner serve  [--db ledger.db] [--data-dir ./data]
//!
//! `serve` reads one submission JSON per stdin line and writes one
//! verdict JSON per stdout line.

mod audit;
mod ledger;

use anyhow::{anyhow, bail, Result};
use audit::{audit, Verdict};
use ledger::Ledger;
use proofplay_core::{
    action_log::Submission,
    autopilot::{autoplay, Autopilot},
    colony::ColonyRules,
    config::{ColonyConfig, LemonadeConfig},
    lemonade::LemonadeRules,
    types::{GameVariant, Round},
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Both rulesets, either standard or loaded from a data directory.
struct RuleBook {
    lemonade: LemonadeRules,
    colony:   ColonyRules,
}

impl RuleBook {
    fn load(data_dir: Option<&str>) -> Result<Self> {
        let Some(dir) = data_dir else {
            return Ok(Self {
                lemonade: LemonadeRules::standard(),
                colony:   ColonyRules::standard(),
            });
        };
        let dir = Path::new(dir);
        Ok(Self {
            lemonade: LemonadeRules::new(LemonadeConfig::load(dir.join("lemonade.json"))?)?,
            colony:   ColonyRules::new(ColonyConfig::load(dir.join("colony.json"))?)?,
        })
    }

    fn audit(&self, ledger: &mut Ledger, submission: &Submission) -> Result<Verdict> {
        match submission.variant {
            GameVariant::Lemonade => audit(&self.lemonade, ledger, submission),
            GameVariant::Colony   => audit(&self.colony, ledger, submission),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("play")   => cmd_play(&args),
        Some("verify") => cmd_verify(&args),
        Some("serve")  => cmd_serve(&args),
        Some(other)    => bail!("unknown command '{other}' (expected play, verify or serve)"),
        None           => bail!("usage: proof-runner <play|verify|serve> [options]"),
    }
}

fn cmd_play(args: &[String]) -> Result<()> {
    let variant: GameVariant = flag(args, "--variant")
        .unwrap_or("lemonade")
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let seed = flag(args, "--seed").ok_or_else(|| anyhow!("play needs --seed"))?;
    let player = flag(args, "--player").unwrap_or(seed);
    let policy_seed = parse_arg(args, "--policy-seed", 1u64);
    let rounds = parse_arg(args, "--rounds", Round::MAX);
    let out = flag(args, "--out");

    match variant {
        GameVariant::Lemonade => play(&LemonadeRules::standard(), player, seed, rounds, policy_seed, out),
        GameVariant::Colony   => play(&ColonyRules::standard(), player, seed, rounds, policy_seed, out),
    }
}

fn play<R: Autopilot>(
    rules:       &R,
    player:      &str,
    seed:        &str,
    rounds:      Round,
    policy_seed: u64,
    out:         Option<&str>,
) -> Result<()> {
    let session = autoplay(rules, seed, rounds, policy_seed)?;
    let card = session.score_card();
    log::info!(
        "played {} '{seed}': {} rounds, score {} ({}), head {}",
        rules.variant(),
        session.rounds().len(),
        card.score,
        card.grade,
        session.chain_head()
    );

    let submission = Submission {
        player:        player.to_string(),
        variant:       rules.variant(),
        seed:          seed.to_string(),
        claimed_score: Some(card.score),
        entries:       session.into_log(),
    };
    let json = submission.to_json()?;
    match out {
        Some(path) => {
            std::fs::write(path, json).map_err(|e| anyhow!("Cannot write {path}: {e}"))?;
            println!("wrote {path}: score {} ({})", card.score, card.grade);
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_verify(args: &[String]) -> Result<()> {
    let input = flag(args, "--in").ok_or_else(|| anyhow!("verify needs --in FILE"))?;
    let db = flag(args, "--db").unwrap_or(":memory:");
    let raw = std::fs::read_to_string(input).map_err(|e| anyhow!("Cannot read {input}: {e}"))?;
    let submission = Submission::from_json(&raw)?;

    let mut ledger = open_ledger(db)?;
    let verdict = match (submission.variant, flag(args, "--rules")) {
        (GameVariant::Lemonade, Some(path)) => {
            let rules = LemonadeRules::new(LemonadeConfig::load(path)?)?;
            audit(&rules, &mut ledger, &submission)?
        }
        (GameVariant::Colony, Some(path)) => {
            let rules = ColonyRules::new(ColonyConfig::load(path)?)?;
            audit(&rules, &mut ledger, &submission)?
        }
        (_, None) => RuleBook::load(None)?.audit(&mut ledger, &submission)?,
    };

    println!("{}", serde_json::to_string_pretty(&verdict)?);
    if let Some(failure) = &verdict.failure {
        bail!("submission failed verification at round {}", failure.round);
    }
    Ok(())
}

fn cmd_serve(args: &[String]) -> Result<()> {
    let db = flag(args, "--db").unwrap_or(":memory:");
    let rules = RuleBook::load(flag(args, "--data-dir"))?;
    let mut ledger = open_ledger(db)?;
    log::info!("serving audits from stdin, ledger at {db}");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let response = match Submission::from_json(&buffer) {
            Ok(submission) => match rules.audit(&mut ledger, &submission) {
                Ok(verdict) => serde_json::to_value(&verdict)?,
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            },
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };
        writeln!(stdout, "{response}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn open_ledger(db: &str) -> Result<Ledger> {
    let ledger = Ledger::open(db)?;
    ledger.migrate()?;
    Ok(ledger)
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
