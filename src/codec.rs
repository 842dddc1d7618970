//! Format Codec Layer
//!
//! Разбирает файл объявленного формата в нормализованное отображение
//! ключ -> значение. Слой никогда не падает на существующем читаемом
//! файле: любой сбой парсинга деградирует в сырой текстовый превью.
//! Единственная ошибка наружу — сам файл не открылся.

use quick_xml::events::Event;
use quick_xml::Reader;
use razgon_core::{ConfigFormat, RazgonError, Result, SettingsMapping};
use std::path::Path;

/// Ключ-сентинел для сырого превью
pub const RAW_PREVIEW_KEY: &str = "raw_config_preview";
/// Лимит превью в символах
pub const RAW_PREVIEW_LIMIT: usize = 1000;

/// Прочитать и разобрать файл настроек.
///
/// `Err` возможен только если файл не читается; непарсибельное
/// содержимое возвращается как превью под [`RAW_PREVIEW_KEY`].
pub async fn read_settings(path: &Path, format: ConfigFormat) -> Result<SettingsMapping> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(parse_content(&content, format))
}

/// Диспетчер по формату. Чистая функция над текстом файла.
pub fn parse_content(content: &str, format: ConfigFormat) -> SettingsMapping {
    match format {
        ConfigFormat::Json => parse_json(content).unwrap_or_else(|| {
            log::debug!("Codec: json parse failed, falling back to raw preview");
            raw_preview(content)
        }),
        ConfigFormat::Ini | ConfigFormat::Yaml | ConfigFormat::Cfg => parse_ini(content),
        ConfigFormat::Xml => parse_xml(content).unwrap_or_else(|| {
            log::debug!("Codec: xml parse failed, falling back to raw preview");
            raw_preview(content)
        }),
        ConfigFormat::KeyValueSpace => parse_key_value_space(content),
        ConfigFormat::Raw => raw_preview(content),
    }
}

/// Записать оптимизированный вариант обратно на диск.
/// Поддерживаются только ini-подобные форматы: только их мы умеем
/// отрисовать обратно в сопоставимый с исходником вид.
pub async fn write_settings(
    path: &Path,
    format: ConfigFormat,
    settings: &SettingsMapping,
) -> Result<()> {
    if !format.is_ini_like() {
        return Err(RazgonError::InvalidFormat(format.as_str().to_string()));
    }
    tokio::fs::write(path, render_ini(settings)).await?;
    Ok(())
}

fn raw_preview(content: &str) -> SettingsMapping {
    let mut settings = SettingsMapping::new();
    settings.insert(
        RAW_PREVIEW_KEY.to_string(),
        content.chars().take(RAW_PREVIEW_LIMIT).collect(),
    );
    settings
}

/// json: только ключи верхнего уровня. Вложенное значение остаётся
/// своим компактным JSON-представлением, внутрь не спускаемся.
fn parse_json(content: &str) -> Option<SettingsMapping> {
    let value: serde_json::Value = serde_json::from_str(content).ok()?;
    let object = value.as_object()?;
    Some(
        object
            .iter()
            .map(|(key, value)| (key.clone(), json_value_to_string(value)))
            .collect(),
    )
}

/// Строки отдаются как есть, всё остальное — компактным JSON
pub(crate) fn json_value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// ini/cfg/yaml-as-ini: секционный key=value текст.
///
/// Толерантен к строке без значения и к дублям (последний побеждает).
/// Ключи пространствуются как `section.key`. Ноль секций — превью.
fn parse_ini(content: &str) -> SettingsMapping {
    let mut settings = SettingsMapping::new();
    let mut section: Option<String> = None;

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            section = Some(line[1..line.len() - 1].trim().to_string());
            continue;
        }
        // Строки до первого заголовка секции игнорируем
        let Some(section_name) = &section else {
            continue;
        };

        // Разделитель '=' либо ':' — что встретится раньше
        let (key, value) = match line.find(['=', ':']) {
            Some(pos) => (line[..pos].trim(), line[pos + 1..].trim()),
            None => (line, ""),
        };
        if key.is_empty() {
            continue;
        }
        settings.insert(format!("{}.{}", section_name, key), value.to_string());
    }

    if section.is_none() {
        return raw_preview(content);
    }
    settings
}

/// xml: обход всех элементов, tag -> текст, последний повтор побеждает.
/// Пути не квалифицируются.
fn parse_xml(content: &str) -> Option<SettingsMapping> {
    let mut reader = Reader::from_reader(content.as_bytes());
    reader.trim_text(true);

    let mut settings = SettingsMapping::new();
    let mut stack: Vec<String> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                stack.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().ok()?;
                let text = text.trim();
                if !text.is_empty() {
                    if let Some(tag) = stack.last() {
                        settings.insert(tag.clone(), text.to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return None,
        }
        buf.clear();
    }

    // Текст без единого элемента — это не xml
    if settings.is_empty() {
        return None;
    }
    Some(settings)
}

/// key_value_space: строка = ключ, пробельный разрыв, значение.
/// Значение теряет одну пару обрамляющих кавычек. Строки, не дающие
/// ровно два токена, пропускаются.
fn parse_key_value_space(content: &str) -> SettingsMapping {
    let mut settings = SettingsMapping::new();
    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, rest)) = line.split_once(char::is_whitespace) else {
            continue;
        };
        let value = rest.trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        settings.insert(key.to_string(), strip_quotes(value).to_string());
    }
    settings
}

fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Отрисовать отображение обратно в ini-текст: глобальные ключи без
/// точки первыми, затем секции по алфавиту
fn render_ini(settings: &SettingsMapping) -> String {
    use std::collections::BTreeMap;

    let mut globals: Vec<(&str, &str)> = Vec::new();
    let mut sections: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();

    for (key, value) in settings {
        match key.split_once('.') {
            Some((section, option)) => sections
                .entry(section)
                .or_default()
                .push((option, value)),
            None => globals.push((key, value)),
        }
    }

    let mut out = String::new();
    for (key, value) in globals {
        out.push_str(&format!("{}={}\n", key, value));
    }
    for (section, options) in sections {
        out.push_str(&format!("[{}]\n", section));
        for (key, value) in options {
            out.push_str(&format!("{}={}\n", key, value));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ini_two_sections_three_keys_exact_values() {
        let content = "\
[Display]
Width=2560
VSync = On

[Audio]
MasterVolume=0.8
";
        let settings = parse_content(content, ConfigFormat::Ini);
        assert_eq!(settings.len(), 3);
        assert_eq!(settings["Display.Width"], "2560");
        assert_eq!(settings["Display.VSync"], "On");
        assert_eq!(settings["Audio.MasterVolume"], "0.8");
    }

    #[test]
    fn ini_duplicate_option_last_wins_and_no_value_allowed() {
        let content = "\
[Video]
Quality=Low
Quality=Ultra
Fullscreen
";
        let settings = parse_content(content, ConfigFormat::Ini);
        assert_eq!(settings["Video.Quality"], "Ultra");
        assert_eq!(settings["Video.Fullscreen"], "");
    }

    #[test]
    fn ini_without_sections_falls_back_to_preview() {
        let content = "just some text\nwithout any section";
        let settings = parse_content(content, ConfigFormat::Cfg);
        assert_eq!(settings.len(), 1);
        assert_eq!(settings[RAW_PREVIEW_KEY], content);
    }

    #[test]
    fn json_top_level_only_nested_kept_verbatim() {
        let content = r#"{"vsync": true, "fov": 90, "name": "Player", "video": {"hdr": false}}"#;
        let settings = parse_content(content, ConfigFormat::Json);
        assert_eq!(settings["vsync"], "true");
        assert_eq!(settings["fov"], "90");
        assert_eq!(settings["name"], "Player");
        assert_eq!(settings["video"], r#"{"hdr":false}"#);
    }

    #[test]
    fn truncated_json_yields_raw_preview_not_error() {
        let content = r#"{"vsync": true, "fov":"#;
        let settings = parse_content(content, ConfigFormat::Json);
        assert_eq!(settings.len(), 1);
        assert_eq!(settings[RAW_PREVIEW_KEY], content);
    }

    #[test]
    fn json_non_object_root_yields_raw_preview() {
        let settings = parse_content("[1, 2, 3]", ConfigFormat::Json);
        assert!(settings.contains_key(RAW_PREVIEW_KEY));
    }

    #[test]
    fn xml_tag_text_last_occurrence_wins() {
        let content = "\
<Settings>
  <Resolution>1920x1080</Resolution>
  <Quality>Low</Quality>
  <Quality>High</Quality>
</Settings>";
        let settings = parse_content(content, ConfigFormat::Xml);
        assert_eq!(settings["Resolution"], "1920x1080");
        assert_eq!(settings["Quality"], "High");
    }

    #[test]
    fn broken_xml_yields_raw_preview() {
        let content = "<Settings><Broken></Settings>";
        let settings = parse_content(content, ConfigFormat::Xml);
        assert!(settings.contains_key(RAW_PREVIEW_KEY));
    }

    #[test]
    fn key_value_space_strips_one_quote_pair() {
        let content = "\
graphics.quality \"3\"
graphics.fov 90
broken_line_without_value
volume '0.5'
";
        let settings = parse_content(content, ConfigFormat::KeyValueSpace);
        assert_eq!(settings.len(), 3);
        assert_eq!(settings["graphics.quality"], "3");
        assert_eq!(settings["graphics.fov"], "90");
        assert_eq!(settings["volume"], "0.5");
    }

    #[test]
    fn raw_preview_caps_at_limit() {
        let content = "x".repeat(5000);
        let settings = parse_content(&content, ConfigFormat::Raw);
        assert_eq!(settings[RAW_PREVIEW_KEY].chars().count(), RAW_PREVIEW_LIMIT);
    }

    #[test]
    fn ini_render_round_trips_through_parser() {
        let content = "\
[Display]
Width=2560
[Audio]
Volume=0.8
";
        let parsed = parse_content(content, ConfigFormat::Ini);
        let rendered = render_ini(&parsed);
        let reparsed = parse_content(&rendered, ConfigFormat::Ini);
        assert_eq!(parsed, reparsed);
    }

    #[tokio::test]
    async fn unreadable_file_is_the_only_error() {
        let result = read_settings(
            Path::new("/no/such/razgon/config.ini"),
            ConfigFormat::Ini,
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn write_back_refuses_non_ini_formats() {
        let settings = SettingsMapping::new();
        let result = write_settings(
            Path::new("/tmp/razgon-never-written.json"),
            ConfigFormat::Json,
            &settings,
        )
        .await;
        assert!(matches!(result, Err(RazgonError::InvalidFormat(_))));
    }
}
