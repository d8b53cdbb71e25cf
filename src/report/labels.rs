//! Localized label text for reports and charts.

use crate::domain::{Locale, LotEstimate, ShelfLife};

/// Every user-facing string a renderer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    pub title: &'static str,
    pub time_axis: &'static str,
    pub potency_axis: &'static str,
    pub observed: &'static str,
    pub regression: &'static str,
    pub band: &'static str,
    pub limit: &'static str,
    pub upper_limit: &'static str,
    pub average: &'static str,
    pub all_series: &'static str,
    /// Prefix of the lot input fields (`Lot 1`, `로트1`).
    pub lot_prefix: &'static str,
    pub shelf_life: &'static str,
    pub months_suffix: &'static str,
    pub infinite: &'static str,
    pub exceeded: &'static str,
}

impl Labels {
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::En => Labels {
                title: "Shelf-life regression",
                time_axis: "months",
                potency_axis: "potency (%)",
                observed: "observed",
                regression: "regression",
                band: "confidence band",
                limit: "lower limit",
                upper_limit: "upper limit",
                average: "Average",
                all_series: "All series",
                lot_prefix: "Lot ",
                shelf_life: "Estimated shelf life",
                months_suffix: " months",
                infinite: "∞ months (no statistically meaningful trend)",
                exceeded: "0 months (limit exceeded)",
            },
            Locale::Ko => Labels {
                title: "유효기한 예측 회귀분석",
                time_axis: "개월",
                potency_axis: "성분함량 (%)",
                observed: "실측값",
                regression: "회귀선",
                band: "신뢰구간",
                limit: "허용 하한",
                upper_limit: "상한선",
                average: "평균",
                all_series: "전체",
                lot_prefix: "로트",
                shelf_life: "예측 유효기한",
                months_suffix: "개월",
                infinite: "∞개월 (통계적 의미 없음)",
                exceeded: "0개월 (기준 초과)",
            },
        }
    }

    /// Shelf life rounded to one decimal place.
    pub fn shelf_life_text(&self, shelf_life: ShelfLife) -> String {
        match shelf_life {
            ShelfLife::Months(t) => format!("{t:.1}{}", self.months_suffix),
            ShelfLife::Infinite => self.infinite.to_string(),
            ShelfLife::Exceeded => self.exceeded.to_string(),
        }
    }

    /// Name of the `k`-th lot input field (1-based).
    pub fn lot_field(&self, k: usize) -> String {
        format!("{}{k}", self.lot_prefix)
    }

    /// Display label of a series (the average is localized).
    pub fn series_label<'a>(&self, entry: &'a LotEstimate) -> &'a str {
        if entry.is_average {
            self.average
        } else {
            entry.label.as_str()
        }
    }
}
