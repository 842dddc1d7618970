//! Логирование в два файла + консоль
//!
//! - razgon.log: человекочитаемый текст, INFO и выше
//! - razgon_events.jsonl: JSON Lines для автоматического анализа, DEBUG и выше

use crate::paths;

/// Инициализирует систему логирования. Вызывается один раз при старте.
pub fn setup_logging() -> Result<(), fern::InitError> {
    let text = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} - razgon - {} - [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(fern::log_file(paths::text_log_file())?);

    let jsonl = fern::Dispatch::new()
        .format(|out, message, record| {
            let entry = serde_json::json!({
                "timestamp": chrono::Local::now().to_rfc3339(),
                "level": record.level().to_string(),
                "module": record.target(),
                "message": message.to_string(),
            });
            out.finish(format_args!("{}", entry))
        })
        .level(log::LevelFilter::Debug)
        .chain(fern::log_file(paths::jsonl_log_file())?);

    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout());

    fern::Dispatch::new()
        .chain(text)
        .chain(jsonl)
        .chain(console)
        .apply()?;

    Ok(())
}
