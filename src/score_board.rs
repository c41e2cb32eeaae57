use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{GameStatus, GameSummary};

const FILE_VERSION: u8 = 1;
const MAX_KEPT: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub name: String,
    pub score: u32,
    pub level: u32,
    pub cleared: bool,
    pub ticks: u64,
    #[serde(rename = "ghostsEaten", alias = "ghosts_eaten")]
    pub ghosts_eaten: u32,
    #[serde(rename = "recordedAt", alias = "recorded_at")]
    pub recorded_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ScoreBoardFile {
    version: u8,
    records: Vec<ScoreRecord>,
}

#[derive(Clone, Debug, Deserialize)]
struct ScoreBoardFileRaw {
    version: u8,
    records: Vec<serde_json::Value>,
}

/// Best finished runs, persisted as a small JSON file. Storage problems are
/// logged and never interrupt play.
pub struct ScoreBoard {
    file_path: PathBuf,
    records: Vec<ScoreRecord>,
}

impl ScoreBoard {
    pub fn open(file_path: PathBuf) -> Self {
        let mut records = load_records(&file_path);
        sort_records(&mut records);
        Self { file_path, records }
    }

    pub fn record(&mut self, name: &str, summary: &GameSummary) -> Option<usize> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let record = ScoreRecord {
            name: name.to_string(),
            score: summary.score,
            level: summary.level,
            cleared: summary.status == GameStatus::LevelComplete,
            ticks: summary.ticks,
            ghosts_eaten: summary.ghosts_eaten,
            recorded_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let rank = self
            .records
            .iter()
            .position(|current| ranks_before(&record, current))
            .unwrap_or(self.records.len());
        self.records.insert(rank, record);
        self.records.truncate(MAX_KEPT);
        self.save();
        (rank < MAX_KEPT).then_some(rank)
    }

    pub fn top(&self, requested_limit: Option<usize>) -> &[ScoreRecord] {
        let limit = requested_limit.unwrap_or(10).clamp(1, MAX_KEPT);
        &self.records[..limit.min(self.records.len())]
    }

    pub fn best(&self) -> Option<&ScoreRecord> {
        self.records.first()
    }

    fn save(&self) {
        if let Some(parent) = self.file_path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                warn!(path = %parent.display(), %error, "failed to create score board dir");
                return;
            }
        }

        let payload = ScoreBoardFile {
            version: FILE_VERSION,
            records: self.records.clone(),
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => {
                if let Err(error) = fs::write(&self.file_path, text) {
                    warn!(path = %self.file_path.display(), %error, "failed to write score board");
                }
            }
            Err(error) => {
                warn!(path = %self.file_path.display(), %error, "failed to serialize score board");
            }
        }
    }
}

/// Higher score first, then the deeper level, then the faster run.
fn ranks_before(a: &ScoreRecord, b: &ScoreRecord) -> bool {
    (b.score, b.level, a.ticks) < (a.score, a.level, b.ticks)
}

fn sort_records(records: &mut [ScoreRecord]) {
    records.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.level.cmp(&a.level))
            .then_with(|| a.ticks.cmp(&b.ticks))
    });
}

fn load_records(path: &Path) -> Vec<ScoreRecord> {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), %error, "failed to read score board");
            }
            return Vec::new();
        }
    };
    let parsed = match serde_json::from_str::<ScoreBoardFileRaw>(&text) {
        Ok(value) if value.version == FILE_VERSION => value,
        Ok(value) => {
            warn!(path = %path.display(), version = value.version, "unsupported score board version");
            return Vec::new();
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "failed to parse score board");
            return Vec::new();
        }
    };

    parsed
        .records
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<ScoreRecord>(raw) {
            Ok(record) if !record.name.trim().is_empty() => Some(record),
            Ok(_) => None,
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping malformed score record");
                None
            }
        })
        .take(MAX_KEPT)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(score: u32, level: u32, ticks: u64, status: GameStatus) -> GameSummary {
        GameSummary {
            status,
            level,
            score,
            lives: 0,
            ticks,
            ghosts_eaten: 1,
            pellets_collected: 10,
        }
    }

    fn temp_file(name: &str) -> PathBuf {
        let unique = format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            rand::random::<u32>()
        );
        std::env::temp_dir().join(unique).join("scores.json")
    }

    fn cleanup(path: &Path) {
        let _ = fs::remove_file(path);
        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn records_are_ranked_and_persisted() {
        let path = temp_file("score-board-rank");
        let mut board = ScoreBoard::open(path.clone());
        assert_eq!(board.record("Alice", &summary(900, 1, 500, GameStatus::GameOver)), Some(0));
        assert_eq!(board.record("Bob", &summary(2400, 2, 900, GameStatus::LevelComplete)), Some(0));
        assert_eq!(board.record("Cara", &summary(900, 1, 300, GameStatus::GameOver)), Some(1));

        let names: Vec<&str> = board.top(None).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Cara", "Alice"]);
        assert!(board.best().is_some_and(|r| r.cleared));

        let reopened = ScoreBoard::open(path.clone());
        assert_eq!(reopened.top(None), board.top(None));

        cleanup(&path);
    }

    #[test]
    fn blank_names_are_not_recorded() {
        let path = temp_file("score-board-blank");
        let mut board = ScoreBoard::open(path.clone());
        assert_eq!(board.record("   ", &summary(100, 1, 10, GameStatus::GameOver)), None);
        assert!(board.top(None).is_empty());
        cleanup(&path);
    }

    #[test]
    fn top_clamps_the_requested_limit() {
        let path = temp_file("score-board-limit");
        let mut board = ScoreBoard::open(path.clone());
        for idx in 0..3 {
            board.record(&format!("P{idx}"), &summary(idx * 10, 1, 10, GameStatus::GameOver));
        }
        assert_eq!(board.top(Some(1)).len(), 1);
        assert_eq!(board.top(Some(0)).len(), 1);
        assert_eq!(board.top(Some(999)).len(), 3);
        cleanup(&path);
    }

    #[test]
    fn load_skips_malformed_records_and_bad_versions() {
        let path = temp_file("score-board-load");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        let raw = r#"{
  "version": 1,
  "records": [
    { "name": "Low", "score": 10, "level": 1, "cleared": false, "ticks": 40,
      "ghostsEaten": 0, "recordedAt": "2026-01-01T00:00:00.000Z" },
    { "name": "Broken", "score": -5 },
    { "name": "High", "score": 500, "level": 1, "cleared": false, "ticks": 90,
      "ghosts_eaten": 2, "recorded_at": "2026-01-02T00:00:00.000Z" }
  ]
}"#;
        fs::write(&path, raw).expect("write file");

        let board = ScoreBoard::open(path.clone());
        let names: Vec<&str> = board.top(None).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["High", "Low"]);

        fs::write(&path, r#"{ "version": 9, "records": [] }"#).expect("write file");
        assert!(ScoreBoard::open(path.clone()).top(None).is_empty());

        fs::write(&path, "not json").expect("write file");
        assert!(ScoreBoard::open(path.clone()).best().is_none());

        cleanup(&path);
    }
}
