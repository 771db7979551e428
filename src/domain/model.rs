use serde::{Deserialize, Serialize};

/// 匯出檔欄位標頭（依原始匯出順序）
pub const CHECKLIST_HEADERS: [&str; 15] = [
    "Código da avaliação",
    "Unidade",
    "Cidade",
    "Região/Grupo",
    "Nome do checklist",
    "Autor",
    "Área",
    "Item",
    "Resposta",
    "Imagens",
    "Data inicial",
    "Data final",
    "Data de sincronização",
    "Resultado",
    "Comentários finais",
];

/// 城市、區域缺值時的預設值
pub const UNDEFINED_LABEL: &str = "Não definido";

/// 稽核清單匯出的一列，空白欄位視為 `None`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChecklistRow {
    #[serde(rename = "Código da avaliação")]
    pub evaluation_id: Option<String>,
    #[serde(rename = "Unidade")]
    pub unit: Option<String>,
    #[serde(rename = "Cidade")]
    pub city: Option<String>,
    #[serde(rename = "Região/Grupo")]
    pub region: Option<String>,
    #[serde(rename = "Nome do checklist")]
    pub checklist_name: Option<String>,
    #[serde(rename = "Autor")]
    pub author: Option<String>,
    #[serde(rename = "Área")]
    pub area: Option<String>,
    #[serde(rename = "Item")]
    pub item: Option<String>,
    #[serde(rename = "Resposta")]
    pub answer: Option<String>,
    #[serde(rename = "Imagens")]
    pub images: Option<String>,
    #[serde(rename = "Data inicial")]
    pub started_at: Option<String>,
    #[serde(rename = "Data final")]
    pub finished_at: Option<String>,
    #[serde(rename = "Data de sincronização")]
    pub synced_at: Option<String>,
    #[serde(rename = "Resultado")]
    pub result: Option<String>,
    #[serde(rename = "Comentários finais")]
    pub final_comments: Option<String>,
}

impl ChecklistRow {
    /// 依標頭順序輸出欄位值
    pub fn values(&self) -> [&str; 15] {
        fn v(field: &Option<String>) -> &str {
            field.as_deref().unwrap_or("")
        }
        [
            v(&self.evaluation_id),
            v(&self.unit),
            v(&self.city),
            v(&self.region),
            v(&self.checklist_name),
            v(&self.author),
            v(&self.area),
            v(&self.item),
            v(&self.answer),
            v(&self.images),
            v(&self.started_at),
            v(&self.finished_at),
            v(&self.synced_at),
            v(&self.result),
            v(&self.final_comments),
        ]
    }
}

/// 清理後的稽核記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub id: Option<String>,
    pub unidade: Option<String>,
    pub cidade: String,
    pub regiao: String,
    pub nome: Option<String>,
    pub autor: Option<String>,
    pub area: Option<String>,
    pub item: Option<String>,
    pub resposta: Option<String>,
    pub total_fotos: usize,
    pub duracao: Option<i64>,
    pub result: Option<f64>,
    pub data_inicial: Option<String>,
    pub data_final: Option<String>,
    pub data_sincronizacao: Option<String>,
    pub final_comments: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub raw_rows: Vec<ChecklistRow>,
    pub cleaned_records: Vec<CleanedRecord>,
    pub raw_csv: String,
    pub cleaned_csv: String,
    pub cleaned_json: String,
}
