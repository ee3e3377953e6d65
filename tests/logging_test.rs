use log::{Level, LevelFilter, Log, Metadata, Record};
use pqc_engine::{CryptoContext, DebugLevel, FLAG_MORE, Result, SchemeId, word1};
use std::sync::Mutex;

// Collects engine records so the test can see what each context emitted
struct Capture {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for Capture {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target() == "pqc_engine"
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let mut records = self.records.lock().unwrap();
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture {
    records: Mutex::new(Vec::new()),
};

fn drain() -> Vec<(Level, String)> {
    std::mem::take(&mut *CAPTURE.records.lock().unwrap())
}

#[test]
fn test_output_follows_context_debug_level() -> Result<()> {
    log::set_logger(&CAPTURE).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let flags = [FLAG_MORE, word1::ISAAC];

    // Silent by default, even for a statistical generator
    let mut quiet = CryptoContext::create(SchemeId::KemKyber, 0, &flags)?;
    quiet.keygen()?;
    let _ = quiet.sign(b"unsupported");
    assert!(drain().is_empty());

    let warned = CryptoContext::builder(SchemeId::KemKyber, 0)
        .flags(&flags)
        .debug_level(DebugLevel::Warning)
        .build()?;
    let records = drain();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].0, Level::Warn);
    assert!(records[0].1.contains("ISAAC-64"));
    drop(warned);

    let mut verbose = CryptoContext::builder(SchemeId::KemKyber, 0)
        .flags(&flags)
        .debug_level(DebugLevel::Debug)
        .build()?;
    verbose.keygen()?;
    let records = drain();
    assert!(records.iter().any(|(level, msg)| *level == Level::Debug && msg.contains("CSPRNG")));
    assert!(records.iter().any(|(level, msg)| *level == Level::Info && msg.contains("key pair")));

    // Errors only once the level is lowered
    verbose.set_debug_level(DebugLevel::Error);
    let _ = verbose.sign(b"unsupported");
    let records = drain();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].0, Level::Error);
    Ok(())
}
