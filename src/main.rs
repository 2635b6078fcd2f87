#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;
extern crate pretty_env_logger;
extern crate rand;
extern crate magescreen;

use std::env;
use std::error::Error;
use std::ops::RangeInclusive;
use std::process;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use rand::SeedableRng;
use rand::rngs::StdRng;

use magescreen::constants::*;
use magescreen::io::table::{read_table, write_table};
use magescreen::model::{self, Criterion, Model};
use magescreen::simulate::simulate;
use magescreen::stats;
use magescreen::table::Table;

type CliResult = Result<(), Box<dyn Error>>;

fn loci_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("loci")
        .short("n")
        .long("loci")
        .takes_value(true)
        .default_value("3")
        .help("Number of targeted loci")
}

fn criterion_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("criterion")
        .long("criterion")
        .takes_value(true)
        .possible_values(&["exact", "at-least"])
        .default_value("exact")
        .help("Screen for exactly k or for at least k replacements")
}

fn confidence_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("confidence")
        .long("confidence")
        .takes_value(true)
        .default_value("0.95")
        .help("Confidence of isolating at least one target clone")
}

fn frequency_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("frequency")
        .short("R")
        .long("frequency")
        .takes_value(true)
        .help("Allelic replacement frequency per locus and cycle")
}

fn cycles_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("cycles")
        .short("N")
        .long("cycles")
        .takes_value(true)
        .help("Number of MAGE cycles")
}

fn replacements_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("replacements")
        .short("k")
        .long("replacements")
        .takes_value(true)
        .help("Number of allelic replacements per clone")
}

fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("magescreen")
        .version(crate_version!())
        .about("Genotype prevalence and colony screening predictions for MAGE experiments")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(SubCommand::with_name("predict")
            .about("Predict genotype prevalence and colonies to screen")
            .arg(loci_arg())
            .arg(frequency_arg().required(true))
            .arg(cycles_arg().required(true))
            .arg(replacements_arg())
            .arg(criterion_arg())
            .arg(confidence_arg()))
        .subcommand(SubCommand::with_name("table")
            .about("Compute a prediction table and write it as CSV")
            .arg(loci_arg())
            .arg(frequency_arg().required(true).multiple(true).use_delimiter(true))
            .arg(cycles_arg().required(true).multiple(true).use_delimiter(true))
            .arg(criterion_arg())
            .arg(confidence_arg())
            .arg(Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .required(true)
                .help("Output CSV file")))
        .subcommand(SubCommand::with_name("show")
            .about("Load a prediction table, filter it and print it")
            .arg(Arg::with_name("input")
                .required(true)
                .index(1)
                .help("Prediction table CSV file"))
            .arg(cycles_arg())
            .arg(frequency_arg())
            .arg(replacements_arg()
                .help("Print prevalence of k replacements across cycles and frequencies")))
        .subcommand(SubCommand::with_name("simulate")
            .about("Simulate MAGE cycles and compare with the binomial model")
            .arg(loci_arg())
            .arg(frequency_arg().required(true))
            .arg(cycles_arg().required(true))
            .arg(Arg::with_name("clones")
                .long("clones")
                .takes_value(true)
                .default_value("100000")
                .help("Number of simulated clones"))
            .arg(Arg::with_name("seed")
                .long("seed")
                .takes_value(true)
                .help("Random seed")))
}

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init_timed();

    let matches = app().get_matches();

    let result = match matches.subcommand() {
        ("predict", Some(m)) => predict(m),
        ("table", Some(m)) => table(m),
        ("show", Some(m)) => show(m),
        ("simulate", Some(m)) => run_simulation(m),
        _ => unreachable!(),
    };

    if let Err(why) = result {
        error!("{}", why);
        process::exit(1);
    }
}

fn criterion(m: &ArgMatches) -> Result<Criterion, Box<dyn Error>> {
    Ok(m.value_of("criterion").unwrap_or("exact").parse::<Criterion>()?)
}

fn predict(m: &ArgMatches) -> CliResult {
    let loci = value_t!(m, "loci", u32)?;
    let frequency = value_t!(m, "frequency", f64)?;
    let cycles = value_t!(m, "cycles", u32)?;
    let confidence = value_t!(m, "confidence", f64)?;
    let criterion = criterion(m)?;
    debug!("predict: n={} R={} N={} criterion={} confidence={}", loci, frequency, cycles, criterion, confidence);

    let model = Model::new(loci, frequency)?;
    model::colonies_to_screen(0.5, confidence)?;
    let replacements = if m.is_present("replacements") {
        Some(value_t!(m, "replacements", u32)?)
    } else {
        None
    };

    println!("# single-locus prevalence after {} cycles: {:.6}", cycles, model.single_locus_prevalence(cycles));
    println!("{:>4} {:>12} {:>12} {:>12}", "k", "exact", "at-least", COL_SCREENED);

    for k in replacement_counts(replacements, loci) {
        let exact = model.prevalence(cycles, k)?;
        let at_least = model.cumulative_prevalence(cycles, k)?;
        let screened = screening_cell(&model, cycles, k, criterion, confidence)?;
        println!("{:>4} {:>12.6} {:>12.6} {:>12}", k, exact, at_least, screened);
    }

    Ok(())
}

/// Replacement counts to report: the requested one, or every count from 0 to n.
fn replacement_counts(replacements: Option<u32>, loci: u32) -> RangeInclusive<u32> {
    match replacements {
        Some(k) => k ..= k,
        None => 0 ..= loci,
    }
}

/// Colonies to screen as printed; NA where the count is undefined or unrepresentable.
fn screening_cell(model: &Model, cycles: u32, k: u32, criterion: Criterion, confidence: f64) -> model::Result<String> {
    match model.screen(cycles, k, criterion, confidence) {
        Ok(s) => Ok(s.to_string()),
        Err(model::Error::UndefinedScreening(f)) | Err(model::Error::ScreeningOverflow(f)) => {
            debug!("k={}: no screening count for fraction {}", k, f);
            Ok(NA.to_owned())
        },
        Err(why) => Err(why),
    }
}

fn table(m: &ArgMatches) -> CliResult {
    let loci = value_t!(m, "loci", u32)?;
    let frequencies = values_t!(m, "frequency", f64)?;
    let cycles = values_t!(m, "cycles", u32)?;
    let confidence = value_t!(m, "confidence", f64)?;
    let criterion = criterion(m)?;
    let output = m.value_of("output").unwrap_or_default();
    debug!("table: n={} R={:?} N={:?} criterion={} confidence={}", loci, frequencies, cycles, criterion, confidence);

    let t = Table::generate(loci, &cycles, &frequencies, criterion, confidence)?;
    write_table(output, &t)?;
    info!("wrote {} rows to {}", t.len(), output);

    Ok(())
}

fn show(m: &ArgMatches) -> CliResult {
    let input = m.value_of("input").unwrap_or_default();
    let cycles = if m.is_present("cycles") { Some(value_t!(m, "cycles", u32)?) } else { None };
    let frequency = if m.is_present("frequency") { Some(value_t!(m, "frequency", f64)?) } else { None };

    let t = read_table(input)?;
    info!("loaded {} rows for {} cycle and {} frequency levels from {}",
          t.len(), t.cycle_levels().len(), t.frequency_levels().len(), input);

    for v in t.check_normalization(NORM_TOL) {
        warn!("prevalence sums to {} for {} cycles at frequency {}", v.total, v.cycles, v.frequency);
    }

    let subset = t.filter(cycles, frequency);
    if subset.is_empty() {
        info!("no rows match the filter");
        return Ok(());
    }

    if m.is_present("replacements") {
        let k = value_t!(m, "replacements", u32)?;
        print!("{}", subset.pivot(k));
    } else {
        print!("{}", subset);
    }

    Ok(())
}

fn run_simulation(m: &ArgMatches) -> CliResult {
    let loci = value_t!(m, "loci", u32)?;
    let frequency = value_t!(m, "frequency", f64)?;
    let cycles = value_t!(m, "cycles", u32)?;
    let clones = value_t!(m, "clones", usize)?;

    let model = Model::new(loci, frequency)?;
    let mut rng = if m.is_present("seed") {
        StdRng::seed_from_u64(value_t!(m, "seed", u64)?)
    } else {
        StdRng::from_entropy()
    };

    let simulated = simulate(&model, cycles, clones, &mut rng);
    let expected = model.distribution(cycles);

    println!("{:>4} {:>12} {:>12}", "k", "simulated", "expected");
    for (k, (s, e)) in simulated.iter().zip(expected.iter()).enumerate() {
        println!("{:>4} {:>12.6} {:>12.6}", k, s, e);
    }
    info!("Jensen-Shannon divergence over {} clones: {:.3e}", clones, stats::js_divergence(&simulated, &expected));

    Ok(())
}
