use crate::workflows::watch::domain::Listing;

pub fn subject_line(count: usize) -> String {
    format!("Found {count} new house matches!")
}

/// HTML digest with one card per listing, in the order given.
pub fn render_digest(matches: &[Listing]) -> String {
    let mut html = String::from(
        "<html><body style=\"font-family: Arial, sans-serif; color: #333;\">\
         <h2 style=\"color: #2c3e50;\">New House Matches Found!</h2>",
    );
    html.push_str(&format!(
        "<p>Found <strong>{}</strong> houses matching the criteria:</p><hr>",
        matches.len()
    ));

    for (position, listing) in matches.iter().enumerate() {
        let year_built = listing
            .year_built
            .map(|year| year.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let schools = listing.schools.all_names();
        let schools = if schools.is_empty() {
            "N/A".to_string()
        } else {
            schools.join(", ")
        };

        html.push_str(&format!(
            "<div style=\"border: 1px solid #ddd; padding: 20px; margin-bottom: 20px; border-radius: 8px;\">\
             <h3 style=\"margin-top: 0; color: #e67e22;\">#{}: {}</h3>\
             <table style=\"width: 100%;\">\
             <tr><td><strong>Price:</strong></td><td>{}</td></tr>\
             <tr><td><strong>Year Built:</strong></td><td>{}</td></tr>\
             <tr><td><strong>Type:</strong></td><td>{}</td></tr>\
             <tr><td><strong>Schools:</strong></td><td>{}</td></tr>\
             </table>\
             <p><a href=\"{}\">View listing</a></p></div>",
            position + 1,
            escape_html(&listing.full_address()),
            listing.formatted_price(),
            year_built,
            escape_html(&listing.property_type),
            escape_html(&schools),
            escape_html(&listing.url),
        ));
    }

    html.push_str(
        "<p style=\"color: #7f8c8d; font-size: 12px;\">This is an automated message from HouseWatch.</p>\
         </body></html>",
    );
    html
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
