//! # 技术领域分类
//!
//! 固定的领域→关键词表上做命中计数。表有序：得分并列时
//! 取表中先出现的领域，保证结果确定。

/// 领域 → 关键词表（顺序即并列时的优先级）
const TECHNOLOGY_AREAS: &[(&str, &[&str])] = &[
    (
        "biotechnology",
        &["biotech", "pharmaceutical", "drug", "medicine", "therapeutic", "protein", "dna", "rna"],
    ),
    (
        "electronics",
        &["electronic", "circuit", "semiconductor", "chip", "processor", "transistor"],
    ),
    (
        "software",
        &["software", "algorithm", "computer", "system", "method", "application", "program"],
    ),
    (
        "medical devices",
        &["medical", "device", "surgical", "diagnostic", "treatment", "implant"],
    ),
    (
        "automotive",
        &["vehicle", "automotive", "engine", "transmission", "brake", "car"],
    ),
    (
        "energy",
        &["energy", "solar", "battery", "fuel", "power", "renewable"],
    ),
    (
        "materials",
        &["material", "polymer", "composite", "alloy", "coating"],
    ),
];

/// 按标题+摘要的关键词命中数分类技术领域
///
/// 无任何命中返回 `None`。相同输入恒产出相同结果。
#[must_use]
pub fn classify_technology_area(title: &str, abstract_text: &str) -> Option<&'static str> {
    let text = format!("{title} {abstract_text}").to_lowercase();

    let mut best: Option<(&'static str, usize)> = None;
    for (area, keywords) in TECHNOLOGY_AREAS {
        let score = keywords.iter().filter(|k| text.contains(*k)).count();
        if score > 0 && best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((area, score));
        }
    }

    best.map(|(area, _)| area)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pharmaceutical_text_classifies_as_biotechnology() {
        let area = classify_technology_area(
            "Pharmaceutical composition",
            "A therapeutic drug for treating protein deficiencies",
        );
        assert_eq!(area, Some("biotechnology"));
    }

    #[test]
    fn circuit_text_classifies_as_electronics() {
        let area = classify_technology_area(
            "Semiconductor device",
            "An integrated circuit with improved transistor layout",
        );
        assert_eq!(area, Some("electronics"));
    }

    #[test]
    fn no_keyword_hits_yield_none() {
        assert_eq!(classify_technology_area("Umbrella", "A rain shield"), None);
    }

    #[test]
    fn ties_break_by_table_order() {
        // "drug" 命中 biotechnology，"circuit" 命中 electronics，各 1 分；
        // biotechnology 在表中先出现
        let area = classify_technology_area("", "a drug delivery circuit");
        assert_eq!(area, Some("biotechnology"));
    }

    #[test]
    fn classification_is_deterministic() {
        let title = "Machine learning system";
        let abstract_text = "A computer-implemented method using an algorithm";
        let first = classify_technology_area(title, abstract_text);
        for _ in 0..10 {
            assert_eq!(classify_technology_area(title, abstract_text), first);
        }
        assert_eq!(first, Some("software"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let area = classify_technology_area("VEHICLE BRAKE SYSTEM", "An AUTOMOTIVE invention");
        assert_eq!(area, Some("automotive"));
    }
}
