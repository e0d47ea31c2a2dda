// src/models/pagination.rs

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u32,
    pub limit: Option<u32>,
}

fn default_page() -> u32 {
    1
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, limit: None }
    }
}

impl PaginationParams {
    /// Limite efetivo: o pedido, ou o padrão configurado, sempre em [1, MAX].
    pub fn effective_limit(&self, default_limit: u32) -> u32 {
        self.limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_LIMIT)
    }
}

// Envelope usado pela API remota e pelas listagens: {data, pagination, message}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> Paginated<T> {
    /// Corta a página `page` (1-based) de `items`.
    pub fn from_items(items: Vec<T>, page: u32, limit: u32) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let total = items.len() as u64;
        let total_pages = total.div_ceil(limit as u64) as u32;
        let skip = (page as usize - 1) * limit as usize;

        let data = items.into_iter().skip(skip).take(limit as usize).collect();

        Self {
            data,
            pagination: PaginationMeta { total, page, limit, total_pages },
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn has_next(&self) -> bool {
        self.pagination.page < self.pagination.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_the_requested_page() {
        let page = Paginated::from_items((1..=45).collect::<Vec<_>>(), 3, 20);
        assert_eq!(page.data, (41..=45).collect::<Vec<_>>());
        assert_eq!(page.pagination.total, 45);
        assert_eq!(page.pagination.total_pages, 3);
        assert!(!page.has_next());
    }

    #[test]
    fn limit_is_clamped() {
        let params = PaginationParams { page: 1, limit: Some(1000) };
        assert_eq!(params.effective_limit(20), MAX_PAGE_LIMIT);
        assert_eq!(PaginationParams::default().effective_limit(20), 20);
    }

    #[test]
    fn envelope_uses_camel_case_meta() {
        let page = Paginated::from_items(vec!["a"], 1, 10).with_message("ok");
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pagination"]["totalPages"], 1);
        assert_eq!(json["message"], "ok");
    }
}
