use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::workflows::watch::domain::{DetailRecord, SchoolTier};

/// Extracts schools, HOA fee, year built and state from a listing detail page.
///
/// Anything that cannot be found is left empty; a page with none of the expected markup
/// yields an empty record rather than an error.
pub fn parse_detail_page(html: &str) -> DetailRecord {
    let document = Html::parse_document(html);
    let mut record = DetailRecord::default();

    for school in elements(&document, ".school-name") {
        let name = text_of(school);
        if name.is_empty() {
            continue;
        }
        match SchoolTier::classify(&name) {
            Some(tier) => record.schools.push(tier, name),
            None => debug!(school = %name, "school name carries no level, dropped"),
        }
    }

    for header in elements(&document, "span.header") {
        let label = text_of(header);
        let Some(value) = header
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .next()
            .map(text_of)
        else {
            continue;
        };

        if label.contains("HOA") {
            record.hoa_fee = leading_number(&value);
        } else if label.contains("Year Built") {
            record.year_built = leading_number(&value).map(|year| year as i32);
        }
    }

    record.state = elements(&document, "link[rel=\"canonical\"]")
        .into_iter()
        .find_map(|link| link.value().attr("href").and_then(state_from_url));

    record
}

fn elements<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(err) => {
            debug!(selector = css, error = %err, "invalid selector");
            Vec::new()
        }
    }
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First number in `value`, ignoring currency symbols and thousands separators:
/// "$1,150/month" reads as 1150.
fn leading_number(value: &str) -> Option<f64> {
    let digits: String = value
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(|c| *c != ',')
        .collect();
    digits.trim_end_matches('.').parse().ok()
}

/// Two-letter state code from a listing URL such as `https://www.redfin.com/IL/Naperville/...`.
fn state_from_url(url: &str) -> Option<String> {
    let path = url.split_once("redfin.com/").map(|(_, path)| path)?;
    let (state, _) = path.split_once('/')?;
    (state.len() == 2 && state.chars().all(|c| c.is_ascii_uppercase())).then(|| state.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><head>
          <link rel="canonical" href="https://www.redfin.com/IL/Naperville/123-Oak-Ave-60540/home/9001">
        </head><body>
          <div class="keyDetail"><span class="header">HOA Dues</span><span class="content">$1,150/month</span></div>
          <div class="keyDetail"><span class="header">Year Built</span><span class="content">1995</span></div>
          <div class="schools">
            <div class="school-name">Highlands Elementary School</div>
            <div class="school-name">Kennedy Junior High School</div>
            <div class="school-name">  Naperville North
                High School </div>
            <div class="school-name">Little Sprouts Academy</div>
          </div>
        </body></html>"#;

    #[test]
    fn extracts_tiers_hoa_year_and_state() {
        let record = parse_detail_page(PAGE);
        assert_eq!(record.schools.elementary, vec!["Highlands Elementary School"]);
        assert_eq!(record.schools.middle, vec!["Kennedy Junior High School"]);
        assert_eq!(record.schools.high, vec!["Naperville North High School"]);
        assert_eq!(record.hoa_fee, Some(1150.0));
        assert_eq!(record.year_built, Some(1995));
        assert_eq!(record.state.as_deref(), Some("IL"));
    }

    #[test]
    fn unrelated_page_is_empty_record() {
        let record = parse_detail_page("<html><body><p>Access denied</p></body></html>");
        assert_eq!(record, DetailRecord::default());
    }

    #[test]
    fn state_requires_two_uppercase_letters() {
        assert_eq!(
            state_from_url("https://www.redfin.com/WI/Madison/1-Main/home/1").as_deref(),
            Some("WI")
        );
        assert_eq!(state_from_url("https://www.redfin.com/city/29501/IL/Naperville"), None);
    }
}
