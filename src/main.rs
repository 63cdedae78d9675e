use std::io::Write as _;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rayon::prelude::*;

mod index;
mod io;
mod overlap;
mod util;

use index::{IndexMeta, ReadIndex};
use io::SeqRecord;
use overlap::block::Diagnostics;
use overlap::correct::{correct_read, CorrectFlag, CorrectParams};
use overlap::multi::to_overlaps;
use overlap::rmdup::{classify_read, DupStatus, RmdupStats};
use overlap::search::Overlapper;

#[derive(Parser, Debug)]
#[command(name = "sga-rust", author, version, about = "Rust read overlapper and error corrector inspired by SGA", arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the bidirectional FM index of a read set
    Index {
        /// Reads FASTA/FASTQ file
        reads: String,
        /// Output prefix for the index file
        #[arg(short, long, default_value = "reads")]
        output: String,
        /// Occ sampling block size
        #[arg(long = "occ-block", default_value_t = 128)]
        occ_block: usize,
    },
    /// Find suffix/prefix overlaps between reads
    Overlap {
        /// Path to read index (.ridx)
        #[arg(short = 'i', long = "index")]
        index: String,
        /// Reads file the index was built from
        reads: String,
        /// Output TSV path (stdout if omitted)
        #[arg(short, long)]
        out: Option<String>,
        /// Minimum overlap length
        #[arg(short = 'm', long = "min-overlap", default_value_t = 45)]
        min_overlap: usize,
        /// Mismatch rate allowed during search (0 = exact)
        #[arg(short = 'e', long = "error-rate", default_value_t = 0.0)]
        error_rate: f64,
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        threads: usize,
    },
    /// Correct sequencing errors by overlap consensus
    Correct {
        /// Path to read index (.ridx)
        #[arg(short = 'i', long = "index")]
        index: String,
        /// Reads file the index was built from
        reads: String,
        /// Output FASTA path (stdout if omitted)
        #[arg(short, long)]
        out: Option<String>,
        /// Minimum overlap length
        #[arg(short = 'm', long = "min-overlap", default_value_t = 21)]
        min_overlap: usize,
        /// Mismatch rate allowed during overlap search
        #[arg(short = 'e', long = "error-rate", default_value_t = 0.04)]
        error_rate: f64,
        /// Per-base error prior of the consensus model
        #[arg(long = "p-error", default_value_t = 0.01)]
        p_error: f64,
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        threads: usize,
    },
    /// Remove duplicate and substring reads
    Rmdup {
        /// Path to read index (.ridx)
        #[arg(short = 'i', long = "index")]
        index: String,
        /// Reads file the index was built from
        reads: String,
        /// Output FASTA path (stdout if omitted)
        #[arg(short, long)]
        out: Option<String>,
        /// Mismatch rate allowed when matching duplicates (0 = exact)
        #[arg(short = 'e', long = "error-rate", default_value_t = 0.0)]
        error_rate: f64,
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        threads: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Index { reads, output, occ_block } => run_index(&reads, &output, occ_block),
        Commands::Overlap { index, reads, out, min_overlap, error_rate, threads } => {
            run_overlap(&index, &reads, out.as_deref(), min_overlap, error_rate, threads)
        }
        Commands::Correct { index, reads, out, min_overlap, error_rate, p_error, threads } => {
            run_correct(&index, &reads, out.as_deref(), min_overlap, error_rate, p_error, threads)
        }
        Commands::Rmdup { index, reads, out, error_rate, threads } => {
            run_rmdup(&index, &reads, out.as_deref(), error_rate, threads)
        }
    }
}

fn run_index(reads_path: &str, output: &str, occ_block: usize) -> Result<()> {
    let records = io::read_sequences(reads_path)
        .map_err(|e| anyhow::anyhow!("cannot read '{}': {}", reads_path, e))?;
    let seqs: Vec<Vec<u8>> = records.iter().map(|r| r.seq.clone()).collect();
    let total_bp: usize = seqs.iter().map(Vec::len).sum();

    println!("reads_file: {}", reads_path);
    println!("reads: {}", records.len());
    println!("total_bp: {}", total_bp);

    let mut idx = ReadIndex::build(&seqs, occ_block)?;
    idx.meta = IndexMeta {
        reads_file: Some(reads_path.to_string()),
        build_args: Some(std::env::args().collect::<Vec<_>>().join(" ")),
        build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
    };

    let out_path = format!("{}.ridx", output);
    idx.save_to_file(&out_path)
        .map_err(|e| anyhow::anyhow!("cannot write index to '{}': {}", out_path, e))?;
    println!("read index saved: {}", out_path);
    Ok(())
}

/// 读入索引与 read 集合并核对两者规模一致。
fn load_index_and_reads(index_path: &str, reads_path: &str) -> Result<(ReadIndex, Vec<SeqRecord>)> {
    let idx = ReadIndex::load_from_file(index_path)
        .map_err(|e| anyhow::anyhow!("cannot load index '{}': {}", index_path, e))?;
    let records = io::read_sequences(reads_path)?;
    if records.len() != idx.num_reads() {
        anyhow::bail!(
            "'{}' holds {} reads but index '{}' was built over {}",
            reads_path,
            records.len(),
            index_path,
            idx.num_reads()
        );
    }
    Ok((idx, records))
}

fn make_writer(out_path: Option<&str>) -> Result<Box<dyn std::io::Write>> {
    Ok(match out_path {
        Some(p) => Box::new(std::io::BufWriter::new(std::fs::File::create(p)?)),
        None => Box::new(std::io::BufWriter::new(std::io::stdout())),
    })
}

fn install_pool(threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| anyhow::anyhow!("cannot build thread pool: {}", e))
}

fn report_diagnostics(diags: impl IntoIterator<Item = Diagnostics>) {
    for diag in diags {
        for msg in diag.messages() {
            eprintln!("warning: {}", msg);
        }
    }
}

/// 拆分逐 read 的结果：失败的 read 连同编号收集为报告行，
/// 成功的带原始下标返回。一条 read 出错不影响同批其他 read。
fn split_failures<T>(
    results: Vec<Result<T>>,
    ids: impl Fn(usize) -> String,
) -> (Vec<(usize, T)>, Vec<String>) {
    let mut ok = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (i, r) in results.into_iter().enumerate() {
        match r {
            Ok(v) => ok.push((i, v)),
            Err(e) => failures.push(format!("read {} skipped: {:#}", ids(i), e)),
        }
    }
    (ok, failures)
}

fn report_failures(failures: &[String]) {
    for line in failures {
        eprintln!("error: {}", line);
    }
    if !failures.is_empty() {
        eprintln!("reads failed: {}", failures.len());
    }
}

fn run_overlap(
    index_path: &str,
    reads_path: &str,
    out_path: Option<&str>,
    min_overlap: usize,
    error_rate: f64,
    threads: usize,
) -> Result<()> {
    let (idx, records) = load_index_and_reads(index_path, reads_path)?;
    let overlapper = Overlapper::new(&idx, error_rate);
    let pool = install_pool(threads)?;

    // 每条 read 一行块：query target 坐标、方向与编辑数
    let per_read: Vec<Result<(Vec<String>, bool, Diagnostics)>> = pool.install(|| {
        records
            .par_iter()
            .enumerate()
            .map(|(i, rec)| -> Result<(Vec<String>, bool, Diagnostics)> {
                let mut diag = Diagnostics::new();
                let result = overlapper.overlap_read(&rec.seq, min_overlap, &mut diag)?;
                let mut lines = Vec::new();
                let found = to_overlaps(&idx, &result.overlaps, i, rec.seq.len())
                    .into_iter()
                    .chain(to_overlaps(&idx, &result.contains, i, rec.seq.len()));
                for o in found {
                    let t: usize = o.target_id.parse()?;
                    lines.push(format!(
                        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                        rec.id,
                        records[t].id,
                        o.query_coord.start,
                        o.query_coord.end,
                        o.query_coord.seq_len,
                        o.target_coord.start,
                        o.target_coord.end,
                        o.target_coord.seq_len,
                        u8::from(o.is_reverse_complement),
                        o.num_diff,
                    ));
                }
                Ok((lines, result.is_substring, diag))
            })
            .collect()
    });
    let (per_read, failures) = split_failures(per_read, |i| records[i].id.clone());

    let mut w = make_writer(out_path)?;
    let mut n_overlaps = 0usize;
    let mut n_substring = 0usize;
    let mut diags = Vec::new();
    for (_, (lines, is_substring, diag)) in per_read {
        n_overlaps += lines.len();
        n_substring += usize::from(is_substring);
        for line in lines {
            writeln!(w, "{}", line)?;
        }
        diags.push(diag);
    }
    w.flush()?;
    report_diagnostics(diags);
    report_failures(&failures);

    eprintln!("overlap records: {}", n_overlaps);
    eprintln!("substring reads: {}", n_substring);
    Ok(())
}

fn run_correct(
    index_path: &str,
    reads_path: &str,
    out_path: Option<&str>,
    min_overlap: usize,
    error_rate: f64,
    p_error: f64,
    threads: usize,
) -> Result<()> {
    let (idx, records) = load_index_and_reads(index_path, reads_path)?;
    let overlapper = Overlapper::new(&idx, error_rate);
    let params = CorrectParams { min_overlap, p_error };
    let pool = install_pool(threads)?;

    let results: Vec<Result<(Vec<u8>, CorrectFlag, Diagnostics)>> = pool.install(|| {
        records
            .par_iter()
            .map(|rec| -> Result<(Vec<u8>, CorrectFlag, Diagnostics)> {
                let mut diag = Diagnostics::new();
                let r =
                    correct_read(&overlapper, &rec.seq, rec.qual.as_deref(), &params, &mut diag)?;
                Ok((r.seq, r.flag, diag))
            })
            .collect()
    });
    let (results, failures) = split_failures(results, |i| records[i].id.clone());

    let w = make_writer(out_path)?;
    io::write_fasta(
        w,
        results.iter().map(|(i, (seq, _, _))| (records[*i].id.as_str(), seq.as_slice())),
    )?;

    let corrected = results.iter().filter(|(_, (_, f, _))| *f == CorrectFlag::Corrected).count();
    let uncorrected = results.len() - corrected;
    report_diagnostics(results.into_iter().map(|(_, (_, _, d))| d));
    report_failures(&failures);
    eprintln!("reads corrected: {}", corrected);
    eprintln!("reads without coverage: {}", uncorrected);
    Ok(())
}

fn run_rmdup(
    index_path: &str,
    reads_path: &str,
    out_path: Option<&str>,
    error_rate: f64,
    threads: usize,
) -> Result<()> {
    let (idx, records) = load_index_and_reads(index_path, reads_path)?;
    let overlapper = Overlapper::new(&idx, error_rate);
    let pool = install_pool(threads)?;

    let statuses: Vec<Result<(DupStatus, Diagnostics)>> = pool.install(|| {
        records
            .par_iter()
            .enumerate()
            .map(|(i, rec)| -> Result<(DupStatus, Diagnostics)> {
                let mut diag = Diagnostics::new();
                let status = classify_read(&overlapper, i, &rec.seq, &mut diag)?;
                Ok((status, diag))
            })
            .collect()
    });
    let (statuses, failures) = split_failures(statuses, |i| records[i].id.clone());

    let mut stats = RmdupStats::default();
    for (_, (status, _)) in &statuses {
        stats.record(*status);
    }

    let w = make_writer(out_path)?;
    io::write_fasta(
        w,
        statuses
            .iter()
            .filter(|(_, (s, _))| *s == DupStatus::Kept)
            .map(|(i, _)| (records[*i].id.as_str(), records[*i].seq.as_slice())),
    )?;
    report_diagnostics(statuses.into_iter().map(|(_, (_, d))| d));
    report_failures(&failures);

    eprintln!("reads kept: {}", stats.kept);
    eprintln!("identical duplicates removed: {}", stats.identical);
    eprintln!("substring reads removed: {}", stats.substring);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_failed_read_does_not_abort_the_batch() {
        let results: Vec<Result<u32>> =
            vec![Ok(10), Err(anyhow::anyhow!("blocks of same length do not align")), Ok(30)];
        let (ok, failures) = split_failures(results, |i| format!("r{}", i));
        // 其余 read 的结果原样保留，下标不变
        assert_eq!(ok, vec![(0, 10), (2, 30)]);
        assert_eq!(failures.len(), 1);
        assert!(failures[0].starts_with("read r1 skipped:"));
        assert!(failures[0].contains("do not align"));
    }

    #[test]
    fn all_reads_succeeding_reports_no_failures() {
        let results: Vec<Result<u32>> = vec![Ok(1), Ok(2)];
        let (ok, failures) = split_failures(results, |i| i.to_string());
        assert_eq!(ok.len(), 2);
        assert!(failures.is_empty());
    }
}
