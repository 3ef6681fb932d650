//! Text rendering of the result card.

use fairlo_core::{DealRating, ScanResult};

/// Renders the result card the way the scanner UI lays it out: item line,
/// region line, big detected price, deal rating pill, insight, and the
/// price comparison footer.
pub fn render_card(result: &ScanResult) -> String {
    let rating = result.deal_rating();
    let badge = match rating {
        DealRating::Underpriced | DealRating::Fair => "✅",
        DealRating::Overpriced => "⚠️",
    };

    let mut lines = vec![
        format!("{} {}", result.emoji, result.name),
        format!("📍 Based on local street prices in {}", result.region),
        String::new(),
        format!("{}{:.0}", result.currency, result.detected_price),
        format!("{badge} {rating} ({:+}%)", result.overprice_percentage),
        String::new(),
        result.insight.clone(),
    ];

    if result.local_price > 0.0 {
        let min_price = (result.local_price * 0.7).round();
        let max_price = (result.local_price * 1.5).round();
        lines.push(String::new());
        lines.push(format!(
            "Price range: {cur}{min_price:.0} - {cur}{max_price:.0} (typical: {range})",
            cur = result.currency,
            range = result.local_range,
        ));
        lines.push(format!(
            "👥 Local: {cur}{local:.0}   📍 You: {cur}{detected:.0}",
            cur = result.currency,
            local = result.local_price,
            detected = result.detected_price,
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_shows_all_sections_for_a_priced_result() {
        let result = ScanResult {
            name: "Wooden Elephant Figurine".to_owned(),
            emoji: "🐘".to_owned(),
            detected_price: 300.0,
            local_price: 150.0,
            currency: "₹".to_owned(),
            local_range: "₹100–₹160".to_owned(),
            overprice_percentage: 100,
            insight: "Slightly above market".to_owned(),
            region: "Jaipur".to_owned(),
        };
        let card = render_card(&result);
        assert!(card.contains("Wooden Elephant Figurine"));
        assert!(card.contains("street prices in Jaipur"));
        assert!(card.contains("₹300"));
        assert!(card.contains("Overpriced (+100%)"));
        assert!(card.contains("₹105 - ₹225"));
        assert!(card.contains("Local: ₹150"));
    }

    #[test]
    fn card_omits_the_price_footer_for_failure_results() {
        let result = ScanResult {
            name: "Analysis Failed".to_owned(),
            emoji: "🤔".to_owned(),
            detected_price: 0.0,
            local_price: 0.0,
            currency: "₹".to_owned(),
            local_range: "—".to_owned(),
            overprice_percentage: 0,
            insight: "We couldn't reach the analysis service.".to_owned(),
            region: "Unknown".to_owned(),
        };
        let card = render_card(&result);
        assert!(card.contains("Analysis Failed"));
        assert!(card.contains("Fair Deal (+0%)"));
        assert!(!card.contains("Price range"));
    }
}
