use std::{
    fmt::Write as _,
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::Mutex,
    thread,
};

use chrono::{format::DelayedFormat, Local};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use once_cell::sync::Lazy;

/// 日誌檔存放的目錄
const LOG_DIR: &str = "log";
/// 累積到這個長度就先寫入檔案
const BATCH_SIZE: usize = 2048;

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("default"));

/// 所有已建立的 Logger，`flush` 時逐一通知
static WRITERS: Lazy<Mutex<Vec<Sender<Message>>>> = Lazy::new(|| Mutex::new(Vec::new()));

enum Message {
    Line(String),
    Flush(Sender<()>),
}

pub struct Logger {
    writer: Sender<Message>,
}

impl Logger {
    pub fn new(log_name: &str) -> Self {
        let writer = Self::create_writer(log_name);

        if let Ok(mut writers) = WRITERS.lock() {
            writers.push(writer.clone());
        }

        Logger { writer }
    }

    pub fn info(&self, log: String) {
        self.send("Info", log);
    }

    pub fn error(&self, log: String) {
        self.send("Error", log);
    }

    pub fn debug(&self, log: String) {
        self.send("Debug", log);
    }

    fn send(&self, level: &str, msg: String) {
        let line = format!("{} {} {}", Local::now().format("%F %X%.6f"), level, msg);
        if let Err(why) = self.writer.send(Message::Line(line)) {
            error_console(why.to_string());
        }
    }

    fn create_writer(log_name: &str) -> Sender<Message> {
        let (tx, rx) = unbounded::<Message>();
        let log_name = log_name.to_string();

        // 寫入檔案的操作使用另一個線程處理
        thread::spawn(move || match Self::open_log_file(&log_name) {
            Ok(file) => Self::write_loop(BufWriter::new(file), rx),
            Err(why) => error_console(format!(
                "Failed to open log file({}) because {:?}",
                log_name, why
            )),
        });

        tx
    }

    fn write_loop(mut writer: BufWriter<File>, rx: Receiver<Message>) {
        let mut pending = String::with_capacity(BATCH_SIZE);

        for received in &rx {
            match received {
                Message::Line(line) => {
                    if writeln!(&mut pending, "{}", line).is_err() {
                        continue;
                    }

                    if rx.is_empty() || pending.len() >= BATCH_SIZE {
                        Self::write_pending(&mut writer, &mut pending);
                    }
                }
                Message::Flush(ack) => {
                    Self::write_pending(&mut writer, &mut pending);
                    let _ = ack.send(());
                }
            }
        }
    }

    fn write_pending(writer: &mut BufWriter<File>, pending: &mut String) {
        if pending.is_empty() {
            return;
        }

        if let Err(why) = writer.write_all(pending.as_bytes()) {
            error_console(format!(
                "Failed to write to log file. because:{:#?}\r\nmsg:{}",
                why, pending
            ));
        }

        if let Err(why) = writer.flush() {
            error_console(format!("Failed to flush log file. because:{:#?}", why));
        }

        pending.clear();
    }

    fn open_log_file(name: &str) -> std::io::Result<File> {
        let path = Path::new(LOG_DIR);

        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        let mut log_path = PathBuf::from(path);
        log_path.push(format!("{}_{}.log", Local::now().format("%Y-%m-%d"), name));

        OpenOptions::new().create(true).append(true).open(log_path)
    }
}

/// 等待所有 Logger 把已送出的訊息寫進檔案
///
/// 單次執行的程式在結束前呼叫，避免背景線程還沒寫完就被結束。
pub fn flush() {
    let writers = match WRITERS.lock() {
        Ok(writers) => writers.clone(),
        Err(_) => return,
    };

    for writer in writers {
        let (ack_tx, ack_rx) = bounded::<()>(1);
        if writer.send(Message::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

pub fn info_file_async(log: String) {
    LOGGER.info(log);
}

pub fn error_file_async(log: String) {
    LOGGER.error(log);
}

pub fn debug_file_async(log: String) {
    LOGGER.debug(log);
}

pub fn info_console(log: String) {
    println!(
        "{} Info {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log
    );
}

pub fn warn_console(log: String) {
    println!(
        "{} Warn {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log
    );
}

pub fn error_console(log: String) {
    println!(
        "{} Error {}",
        DelayedFormat::to_string(&Local::now().format("%Y-%m-%d %H:%M:%S.%3f")),
        log
    );
}
