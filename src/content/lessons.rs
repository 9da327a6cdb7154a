//! Lesson bodies loaded from `lessons/<lang>/`
//!
//! French lessons are published as `leconN.txt`, English ones as
//! `lessonN.txt`; the loader also probes the other naming as a fallback
//! since published content has historically mixed the two.

use super::ContentResult;
use crate::texts::Lang;
use std::path::PathBuf;

/// Filesystem-backed lesson bodies
#[derive(Debug, Clone)]
pub struct FsLessons {
    dir: PathBuf,
}

impl FsLessons {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn candidates(&self, lang: Lang, number: u8) -> [PathBuf; 2] {
        let base = self.dir.join(lang.code());
        match lang {
            Lang::Fr => [
                base.join(format!("lecon{number}.txt")),
                base.join(format!("lesson{number}.txt")),
            ],
            Lang::En => [
                base.join(format!("lesson{number}.txt")),
                base.join(format!("lecon{number}.txt")),
            ],
        }
    }

    /// Body of one lesson, or `None` when no file exists for it
    pub async fn load(&self, lang: Lang, number: u8) -> ContentResult<Option<String>> {
        for path in self.candidates(lang, number) {
            match tokio::fs::read_to_string(&path).await {
                Ok(body) => return Ok(Some(body)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }
}
