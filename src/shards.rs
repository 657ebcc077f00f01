//! Shard scripts for parallel registration.
//!
//! The identifiers are sorted by year and dealt round-robin into N
//! lists of canonical document paths. Each list gets a `.lst` file plus
//! empty `.jsonl` (results) and `.out` (stdout) siblings, and one shell
//! script launches the registration command once per list:
//!
//! ```text
//! nohup <register_command> register_new_papers <list>.lst <list>.jsonl><list>.out&
//! ```
//!
//! Shards never share a pid, so the processes never write the same file.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use isis_dataprep_core::pid::Pid;

use crate::csv_rows::read_pids;
use crate::json_store::canonical_path;

/// One shard list on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardList {
    pub list: PathBuf,
    pub results: PathBuf,
    pub out: PathBuf,
    pub len: usize,
}

/// Sort pids by year (`pid[10:14]`), keeping input order within a year.
pub fn sort_by_year(mut pids: Vec<Pid>) -> Vec<Pid> {
    pids.sort_by(|a, b| a.year().cmp(b.year()));
    pids
}

/// Deal `items` round-robin into `n` lists. Lists may be empty.
pub fn split_round_robin<T: Clone>(items: &[T], n: usize) -> Vec<Vec<T>> {
    let n = n.max(1);
    let mut lists = vec![Vec::new(); n];
    for (i, item) in items.iter().enumerate() {
        lists[i % n].push(item.clone());
    }
    lists
}

/// `<prefix>_<i>_<len>_<total>`, with `i` starting at 1.
pub fn shard_name(prefix: &str, index: usize, len: usize, total: usize) -> String {
    format!("{}_{}_{}_{}", prefix, index + 1, len, total)
}

/// Default list prefix: the identifiers CSV file stem.
pub fn default_prefix(pids_csv: &Path) -> String {
    pids_csv
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pids".to_string())
}

/// Write the shard lists and the launcher script.
pub fn write_shards(
    paths: &[PathBuf],
    lists_dir: &Path,
    script: &Path,
    prefix: &str,
    count: usize,
    register_command: &str,
) -> Result<Vec<ShardList>> {
    fs::create_dir_all(lists_dir)
        .with_context(|| format!("Failed to create directory: {}", lists_dir.display()))?;

    let total = paths.len();
    let mut shards = Vec::new();
    for (i, chunk) in split_round_robin(paths, count).iter().enumerate() {
        let name = shard_name(prefix, i, chunk.len(), total);
        let list = lists_dir.join(format!("{}.lst", name));
        let results = lists_dir.join(format!("{}.jsonl", name));
        let out = lists_dir.join(format!("{}.out", name));

        let body = chunk
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(&list, body).with_context(|| format!("Failed to write {}", list.display()))?;
        for empty in [&results, &out] {
            fs::write(empty, "").with_context(|| format!("Failed to write {}", empty.display()))?;
        }

        shards.push(ShardList {
            list,
            results,
            out,
            len: chunk.len(),
        });
    }

    let script_body: String = shards
        .iter()
        .map(|s| {
            format!(
                "nohup {} register_new_papers {} {}>{}&\n",
                register_command,
                s.list.display(),
                s.results.display(),
                s.out.display()
            )
        })
        .collect();
    if let Some(parent) = script.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(script, script_body)
        .with_context(|| format!("Failed to write {}", script.display()))?;
    Ok(shards)
}

/// Read identifiers, map them to canonical document paths under `root`
/// and write `count` shards.
pub fn run_shards(
    pids_csv: &Path,
    root: &Path,
    lists_dir: &Path,
    script: &Path,
    prefix: Option<&str>,
    count: usize,
    register_command: &str,
) -> Result<Vec<ShardList>> {
    let pids = sort_by_year(read_pids(pids_csv)?);
    let paths: Vec<PathBuf> = pids.iter().map(|pid| canonical_path(root, pid)).collect();
    let prefix = prefix
        .map(str::to_string)
        .unwrap_or_else(|| default_prefix(pids_csv));

    let shards = write_shards(&paths, lists_dir, script, &prefix, count, register_command)?;

    println!("shards {}", pids_csv.display());
    println!("  pids: {}", paths.len());
    println!("  lists: {}", shards.len());
    for shard in &shards {
        println!("    {} ({})", shard.list.display(), shard.len);
    }
    println!("  script: {}", script.display());
    println!("ok");
    Ok(shards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn round_robin() {
        let lists = split_round_robin(&[1, 2, 3, 4, 5], 2);
        assert_eq!(lists, vec![vec![1, 3, 5], vec![2, 4]]);
        assert_eq!(split_round_robin(&[1], 3), vec![vec![1], vec![], vec![]]);
    }

    #[test]
    fn year_sort_is_stable() {
        let pids: Vec<Pid> = [
            "S0001-37652021000100002",
            "S0001-37652019000100009",
            "S0002-37652021000100001",
            "S0001-37652019000100001",
        ]
        .iter()
        .map(|p| Pid::parse(p).unwrap())
        .collect();
        let sorted = sort_by_year(pids);
        assert_eq!(sorted[0].as_str(), "S0001-37652019000100009");
        assert_eq!(sorted[1].as_str(), "S0001-37652019000100001");
        assert_eq!(sorted[2].as_str(), "S0001-37652021000100002");
        assert_eq!(sorted[3].as_str(), "S0002-37652021000100001");
    }

    #[test]
    fn names() {
        assert_eq!(shard_name("pids", 0, 3, 10), "pids_1_3_10");
        assert_eq!(default_prefix(Path::new("/in/acta_2020.csv")), "acta_2020");
    }

    #[test]
    fn writes_lists_and_script() {
        let tmp = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = (0..3).map(|i| PathBuf::from(format!("/j/{}_rs.json", i))).collect();
        let lists = tmp.path().join("lists");
        let script = tmp.path().join("run.sh");

        let shards = write_shards(&paths, &lists, &script, "p", 2, "rs").unwrap();
        assert_eq!(shards.len(), 2);
        assert_eq!(
            fs::read_to_string(lists.join("p_1_2_3.lst")).unwrap(),
            "/j/0_rs.json\n/j/2_rs.json"
        );
        assert!(lists.join("p_2_1_3.jsonl").is_file());
        assert!(lists.join("p_2_1_3.out").is_file());

        let body = fs::read_to_string(&script).unwrap();
        let first = format!(
            "nohup rs register_new_papers {l}/p_1_2_3.lst {l}/p_1_2_3.jsonl>{l}/p_1_2_3.out&",
            l = lists.display()
        );
        assert_eq!(body.lines().next().unwrap(), first);
        assert_eq!(body.lines().count(), 2);
    }

    #[test]
    fn long_and_short_pid_share_one_shard() {
        let tmp = TempDir::new().unwrap();
        let pids = tmp.path().join("batch.csv");
        fs::write(
            &pids,
            "pid\nS0001-3765202000010000100003\nS0001-37652020000100001\nS0002-37652019000100001\n",
        )
        .unwrap();
        let root = tmp.path().join("json");
        let shards = run_shards(
            &pids,
            &root,
            &tmp.path().join("lists"),
            &tmp.path().join("run.sh"),
            None,
            2,
            "rs",
        )
        .unwrap();

        let listed: Vec<String> = shards
            .iter()
            .flat_map(|s| {
                fs::read_to_string(&s.list)
                    .unwrap()
                    .lines()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        assert_eq!(listed.len(), 2);
        let doc = root
            .join("0001-3765/2020/S0001-37652020000100001_rs.json")
            .display()
            .to_string();
        assert_eq!(listed.iter().filter(|p| **p == doc).count(), 1);
    }
}
