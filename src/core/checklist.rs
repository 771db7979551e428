use crate::domain::model::{ChecklistRow, CleanedRecord, CHECKLIST_HEADERS, UNDEFINED_LABEL};
use crate::utils::error::{HawkeyeError, Result};
use chrono::{NaiveDateTime, Timelike};
use std::collections::HashSet;
use std::io::{Cursor, Read};

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// 解析單一 CSV 匯出檔
pub fn parse_csv(data: &[u8]) -> Result<Vec<ChecklistRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut rows = Vec::new();
    for row in reader.deserialize::<ChecklistRow>() {
        rows.push(row?);
    }
    Ok(rows)
}

/// 取出 ZIP 壓縮檔內所有 CSV（依檔名排序）
pub fn csv_entries_from_zip(data: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    let mut entries = Vec::new();

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() || !file.name().to_ascii_lowercase().ends_with(".csv") {
            continue;
        }
        let name = file.name().to_string();
        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        entries.push((name, content));
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// 兩個時間跨越的分鐘邊界數（先截到分鐘再相減）
pub fn duration_minutes(start: Option<&str>, end: Option<&str>) -> Option<i64> {
    let start = parse_timestamp(start?)?.with_second(0)?.with_nanosecond(0)?;
    let end = parse_timestamp(end?)?.with_second(0)?.with_nanosecond(0)?;
    Some((end - start).num_minutes())
}

pub fn count_photos(images: Option<&str>) -> usize {
    // 與 string_split(' ') 相同：連續空白會產生空項目
    images.map(|s| s.split(' ').count()).unwrap_or(0)
}

/// 分數欄位使用逗號作為小數點
pub fn parse_score(raw: Option<&str>, evaluation_id: Option<&str>) -> Result<Option<f64>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    raw.replace(',', ".")
        .parse::<f64>()
        .map(Some)
        .map_err(|_| HawkeyeError::ProcessingError {
            message: format!(
                "Invalid Resultado '{}' for evaluation {}",
                raw,
                evaluation_id.unwrap_or("<unknown>")
            ),
        })
}

pub fn clean_row(row: &ChecklistRow) -> Result<CleanedRecord> {
    Ok(CleanedRecord {
        id: row.evaluation_id.clone(),
        unidade: row.unit.clone(),
        cidade: row.city.clone().unwrap_or_else(|| UNDEFINED_LABEL.to_string()),
        regiao: row
            .region
            .clone()
            .unwrap_or_else(|| UNDEFINED_LABEL.to_string()),
        nome: row.checklist_name.clone(),
        autor: row.author.clone(),
        area: row.area.clone(),
        item: row.item.clone(),
        resposta: row.answer.clone(),
        total_fotos: count_photos(row.images.as_deref()),
        duracao: duration_minutes(row.started_at.as_deref(), row.finished_at.as_deref()),
        result: parse_score(row.result.as_deref(), row.evaluation_id.as_deref())?,
        data_inicial: row.started_at.clone(),
        data_final: row.finished_at.clone(),
        data_sincronizacao: row.synced_at.clone(),
        final_comments: row.final_comments.clone(),
    })
}

/// 清理所有列並去除完全重複的記錄，保留首次出現的順序
pub fn clean_rows(rows: &[ChecklistRow]) -> Result<Vec<CleanedRecord>> {
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let record = clean_row(row)?;
        // JSON 會把 NaN 寫成 null，分數另以位元比較
        let without_score = CleanedRecord {
            result: None,
            ..record.clone()
        };
        let key = (
            serde_json::to_string(&without_score)?,
            record.result.map(f64::to_bits),
        );
        if seen.insert(key) {
            records.push(record);
        }
    }

    let duplicates = rows.len() - records.len();
    if duplicates > 0 {
        tracing::debug!("Dropped {} duplicate checklist rows", duplicates);
    }
    Ok(records)
}

pub fn raw_to_csv(rows: &[ChecklistRow]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CHECKLIST_HEADERS)?;
    for row in rows {
        writer.write_record(row.values())?;
    }
    into_string(writer)
}

pub fn cleaned_to_csv(records: &[CleanedRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    into_string(writer)
}

fn into_string(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| HawkeyeError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| HawkeyeError::ProcessingError {
        message: format!("CSV output is not valid UTF-8: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::{SimpleFileOptions, ZipWriter};

    const SAMPLE: &str = "\
Código da avaliação,Unidade,Cidade,Região/Grupo,Nome do checklist,Autor,Área,Item,Resposta,Imagens,Data inicial,Data final,Data de sincronização,Resultado,Comentários finais,Extra
101,SUPERMERCADO RODRIGUES,Uberlândia,,Auditoria LM,Ana,Padaria,Limpeza,Conforme,a.jpg b.jpg,2025-09-22 08:00:40,2025-09-22 08:45:10,2025-09-22 09:00:00,\"87,5\",ok,x
";

    fn row() -> ChecklistRow {
        parse_csv(SAMPLE.as_bytes()).unwrap().remove(0)
    }

    #[test]
    fn test_parse_csv_maps_headers_and_blanks() {
        let row = row();
        assert_eq!(row.evaluation_id.as_deref(), Some("101"));
        assert_eq!(row.city.as_deref(), Some("Uberlândia"));
        assert_eq!(row.region, None);
        assert_eq!(row.result.as_deref(), Some("87,5"));
    }

    #[test]
    fn test_parse_csv_tolerates_missing_columns() {
        let data = "Código da avaliação,Unidade\n7,LOJA 1\n";
        let rows = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].unit.as_deref(), Some("LOJA 1"));
        assert!(rows[0].images.is_none());
    }

    #[test]
    fn test_clean_row() {
        let record = clean_row(&row()).unwrap();
        assert_eq!(record.cidade, "Uberlândia");
        assert_eq!(record.regiao, UNDEFINED_LABEL);
        assert_eq!(record.total_fotos, 2);
        assert_eq!(record.duracao, Some(45));
        assert_eq!(record.result, Some(87.5));
    }

    #[test]
    fn test_duration_counts_minute_boundaries() {
        assert_eq!(
            duration_minutes(Some("2025-09-22 08:00:59"), Some("2025-09-22 08:01:00")),
            Some(1)
        );
        assert_eq!(
            duration_minutes(Some("22/09/2025 08:00"), Some("22/09/2025 09:30")),
            Some(90)
        );
        assert_eq!(duration_minutes(Some("ontem"), Some("2025-09-22 08:00")), None);
        assert_eq!(duration_minutes(None, Some("2025-09-22 08:00")), None);
    }

    #[test]
    fn test_count_photos() {
        assert_eq!(count_photos(None), 0);
        assert_eq!(count_photos(Some("a.jpg")), 1);
        assert_eq!(count_photos(Some("a.jpg b.jpg c.jpg")), 3);
    }

    #[test]
    fn test_invalid_score_fails_with_evaluation_id() {
        let err = parse_score(Some("n/a"), Some("101")).unwrap_err();
        assert!(err.to_string().contains("101"));
        assert_eq!(parse_score(None, Some("101")).unwrap(), None);
    }

    #[test]
    fn test_clean_rows_drops_duplicates() {
        let rows = vec![row(), row(), ChecklistRow::default()];
        let records = clean_rows(&rows).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.as_deref(), Some("101"));
        assert_eq!(records[1].cidade, UNDEFINED_LABEL);
    }

    #[test]
    fn test_clean_rows_keeps_nan_score_apart_from_missing_score() {
        let plain = ChecklistRow {
            evaluation_id: Some("1".to_string()),
            ..Default::default()
        };
        let nan = ChecklistRow {
            result: Some("NaN".to_string()),
            ..plain.clone()
        };

        let records = clean_rows(&[plain, nan.clone(), nan]).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].result, None);
        assert!(records[1].result.is_some_and(f64::is_nan));
    }

    #[test]
    fn test_raw_csv_keeps_export_headers() {
        let csv = raw_to_csv(&[row()]).unwrap();
        let header = csv.lines().next().unwrap();
        assert!(header.starts_with("Código da avaliação,Unidade"));
        assert!(!header.contains("Extra"));
        assert!(csv.contains("\"87,5\""));
    }

    #[test]
    fn test_zip_entries_only_csv() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("b.csv", SimpleFileOptions::default()).unwrap();
        zip.write_all(SAMPLE.as_bytes()).unwrap();
        zip.start_file("notes.txt", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"ignore").unwrap();
        zip.start_file("a.CSV", SimpleFileOptions::default()).unwrap();
        zip.write_all(SAMPLE.as_bytes()).unwrap();
        let data = zip.finish().unwrap().into_inner();

        let entries = csv_entries_from_zip(&data).unwrap();
        let names: Vec<_> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a.CSV", "b.csv"]);
    }
}
