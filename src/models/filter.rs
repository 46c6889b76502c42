//! 归档筛选表单状态

use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;

/// 字段值的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSource {
    /// 输入框的 value
    Value,
    /// 下拉框的 data-value-selecteditemindex
    SelectedIndex,
    /// 固定值
    Constant(&'static str),
}

/// 筛选表单字段定义
#[derive(Debug, Clone, Copy)]
pub struct FilterField {
    /// 表单字段名
    pub name: &'static str,
    /// DOM 选择器（常量字段为空）
    pub selector: &'static str,
    pub source: FilterSource,
}

/// 行请求需要携带的筛选字段，按提交顺序排列
pub const FILTER_FIELDS: &[FilterField] = &[
    FilterField {
        name: "dateRangeComponent.startDate.text",
        selector: "#documentArchiveListForm_dateRangeComponent_startDate",
        source: FilterSource::Value,
    },
    FilterField {
        name: "dateRangeComponent.endDate.text",
        selector: "#documentArchiveListForm_dateRangeComponent_endDate",
        source: FilterSource::Value,
    },
    FilterField {
        name: "accountSelection.account.selecteditemindex",
        selector: "#documentArchiveListForm_accountSelection_account",
        source: FilterSource::SelectedIndex,
    },
    FilterField {
        name: "documentCategory.selecteditemindex",
        selector: "#documentArchiveListForm_documentCategory",
        source: FilterSource::SelectedIndex,
    },
    FilterField {
        name: "readState.selecteditemindex",
        selector: "#documentArchiveListForm_readState",
        source: FilterSource::SelectedIndex,
    },
    FilterField {
        name: "dateRangeComponent.retrievalPeriodSelection.selecteditemindex",
        selector: "#documentArchiveListForm_dateRangeComponent_retrievalPeriodSelection",
        source: FilterSource::SelectedIndex,
    },
    FilterField {
        name: "storeSettings.checked",
        selector: "",
        source: FilterSource::Constant("off"),
    },
];

/// 当前筛选状态（字段名 → 值），保持字段顺序
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<(String, String)>")]
pub struct FilterState {
    fields: Vec<(String, String)>,
}

impl From<Vec<(String, String)>> for FilterState {
    fn from(fields: Vec<(String, String)>) -> Self {
        let mut state = FilterState::default();
        for (name, value) in fields {
            state.set(name, value);
        }
        state
    }
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置字段，同名字段覆盖原值并保持原位置
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// 日期输入框缺失时的默认起止日期（dd.mm.yyyy），起始为五年前的 1 月 1 日
pub fn default_date_range(today: NaiveDate) -> (String, String) {
    let start = format!("01.01.{}", today.year() - 5);
    let end = today.format("%d.%m.%Y").to_string();
    (start, end)
}

/// 以本地日期计算默认起止日期
pub fn default_date_range_today() -> (String, String) {
    default_date_range(Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overrides_in_place() {
        let mut state = FilterState::new();
        state.set("a", "1");
        state.set("b", "2");
        state.set("a", "3");

        let pairs: Vec<_> = state.iter().collect();
        assert_eq!(pairs, vec![("a", "3"), ("b", "2")]);
        assert_eq!(state.get("a"), Some("3"));
        assert_eq!(state.get("missing"), None);
    }

    #[test]
    fn test_deserialize_from_pairs() {
        let state: FilterState =
            serde_json::from_str(r#"[["storeSettings.checked","off"],["readState.selecteditemindex","1"]]"#)
                .unwrap();
        assert_eq!(state.len(), 2);
        assert_eq!(state.get("readState.selecteditemindex"), Some("1"));
    }

    #[test]
    fn test_default_date_range() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let (start, end) = default_date_range(today);
        assert_eq!(start, "01.01.2021");
        assert_eq!(end, "19.10.2026");
    }

    #[test]
    fn test_filter_fields_are_unique() {
        let mut names: Vec<_> = FILTER_FIELDS.iter().map(|f| f.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), FILTER_FIELDS.len());
    }
}
