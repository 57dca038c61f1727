//! # 行业关键词映射
//!
//! 行业标识到检索关键词列表的静态查找表

/// 行业 → 关键词映射表
///
/// 未命中的行业值作为单关键词透传，对合作方的自由文本过滤保持宽容。
const INDUSTRY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "biotech",
        &["biotechnology", "pharmaceutical", "drug", "medicine", "therapeutic"],
    ),
    (
        "electronics",
        &["electronic", "circuit", "semiconductor", "chip", "processor"],
    ),
    (
        "software",
        &["software", "algorithm", "computer", "system", "method"],
    ),
    (
        "medical",
        &["medical", "device", "surgical", "diagnostic", "treatment"],
    ),
    (
        "automotive",
        &["vehicle", "automotive", "engine", "transmission", "brake"],
    ),
];

/// 将行业字符串解析为关键词列表
///
/// `None` 或空串返回空列表（不做行业过滤）。
#[must_use]
pub fn industry_keywords(industry: Option<&str>) -> Vec<String> {
    let Some(industry) = industry else {
        return Vec::new();
    };
    if industry.is_empty() {
        return Vec::new();
    }

    let industry_lower = industry.to_lowercase();
    for (name, keywords) in INDUSTRY_KEYWORDS {
        if *name == industry_lower {
            return keywords.iter().map(|k| (*k).to_string()).collect();
        }
    }

    // 未知行业：作为单关键词透传
    vec![industry_lower]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn biotech_resolves_to_fixed_keyword_list() {
        assert_eq!(
            industry_keywords(Some("biotech")),
            vec!["biotechnology", "pharmaceutical", "drug", "medicine", "therapeutic"]
        );
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(
            industry_keywords(Some("BioTech")),
            industry_keywords(Some("biotech"))
        );
    }

    #[test]
    fn unknown_industry_passes_through_as_single_keyword() {
        assert_eq!(industry_keywords(Some("quantum")), vec!["quantum"]);
    }

    #[test]
    fn absent_industry_yields_empty_list() {
        assert!(industry_keywords(None).is_empty());
        assert!(industry_keywords(Some("")).is_empty());
    }
}
