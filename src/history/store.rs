use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::{history::Snapshot, logging};

/// 讀取歷史檔
///
/// 檔案不存在或內容無法解析時視為沒有歷史，不會回傳錯誤。
pub fn load(path: &Path) -> Vec<Snapshot> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(why) if why.kind() == ErrorKind::NotFound => {
            logging::info_file_async(format!(
                "{} does not exist yet, start with an empty history",
                path.display()
            ));
            return Vec::new();
        }
        Err(why) => {
            logging::warn_console(format!(
                "Failed to read {} because {:?}, start with an empty history",
                path.display(),
                why
            ));
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Snapshot>>(&text) {
        Ok(history) => history,
        Err(why) => {
            logging::warn_console(format!(
                "{} is not a valid history file because {}, start with an empty history",
                path.display(),
                why
            ));
            Vec::new()
        }
    }
}

/// 寫入歷史檔，先寫到暫存檔再改名覆蓋
pub fn save(path: &Path, history: &[Snapshot]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(history)?;
    let tmp = temp_path(path);

    fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    if let Err(why) = fs::rename(&tmp, path) {
        // 改名失敗時不留下暫存檔
        let _ = fs::remove_file(&tmp);
        return Err(why).with_context(|| {
            format!(
                "Failed to replace {} with {}",
                path.display(),
                tmp.display()
            )
        });
    }

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
