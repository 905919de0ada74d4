use crate::models::sections::{ordered_sections, ResumeDocument, Section};

/// Renders a resume document as markdown, one block per section in display
/// order. Sections whose data has no typed shape are dumped as JSON.
pub fn render_document_to_md(doc: &ResumeDocument) -> String {
    let mut md = String::new();
    for section in ordered_sections(doc) {
        render_section(&mut md, &section);
    }
    md
}

fn render_section(md: &mut String, section: &Section) {
    match section {
        Section::ContactInfo(contact) => {
            md.push_str(&format!(
                "# {}\n\n",
                contact.name.as_deref().unwrap_or("Resume")
            ));
            let details: Vec<&str> = [
                &contact.email,
                &contact.phone,
                &contact.location,
                &contact.linkedin,
                &contact.website,
            ]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .collect();
            if !details.is_empty() {
                md.push_str(&format!("{}\n\n", details.join(" | ")));
            }
        }
        Section::Summary(text) => {
            md.push_str("## Summary\n\n");
            md.push_str(&format!("{}\n\n", text.trim()));
        }
        Section::Skills(groups) => {
            md.push_str("## Skills\n\n");
            for (group, items) in groups.iter().filter(|(_, items)| !items.is_empty()) {
                md.push_str(&format!(
                    "- **{}:** {}\n",
                    humanize_key(group),
                    items.join(", ")
                ));
            }
            md.push('\n');
        }
        Section::WorkExperience(jobs) => {
            md.push_str("## Work Experience\n\n");
            for job in jobs {
                md.push_str(&format!("### {} — {}\n", job.title, job.company));
                if let Some(range) = date_range(&job.start_date, &job.end_date) {
                    md.push_str(&format!("*{range}*"));
                    if let Some(location) = &job.location {
                        md.push_str(&format!(" · {location}"));
                    }
                    md.push('\n');
                }
                for highlight in &job.highlights {
                    md.push_str(&format!("- {highlight}\n"));
                }
                md.push('\n');
            }
        }
        Section::Education(schools) => {
            md.push_str("## Education\n\n");
            for school in schools {
                md.push_str(&format!("### {}\n", school.institution));
                let degree: Vec<&str> = [&school.degree, &school.field]
                    .into_iter()
                    .filter_map(|f| f.as_deref())
                    .collect();
                if !degree.is_empty() {
                    md.push_str(&format!("{}\n", degree.join(", ")));
                }
                if let Some(range) = date_range(&school.start_date, &school.end_date) {
                    md.push_str(&format!("*{range}*\n"));
                }
                if let Some(gpa) = &school.gpa {
                    md.push_str(&format!("- **GPA:** {gpa}\n"));
                }
                md.push('\n');
            }
        }
        Section::Projects(projects) => {
            md.push_str("## Projects\n\n");
            for project in projects {
                match &project.url {
                    Some(url) => md.push_str(&format!("### [{}]({url})\n", project.name)),
                    None => md.push_str(&format!("### {}\n", project.name)),
                }
                if let Some(description) = &project.description {
                    md.push_str(&format!("{description}\n"));
                }
                if !project.technologies.is_empty() {
                    md.push_str(&format!(
                        "- **Tech:** {}\n",
                        project.technologies.join(", ")
                    ));
                }
                md.push('\n');
            }
        }
        Section::Certifications(certs) => {
            md.push_str("## Certifications\n\n");
            for cert in certs {
                let mut line = format!("- {}", cert.name);
                if let Some(issuer) = &cert.issuer {
                    line.push_str(&format!(", {issuer}"));
                }
                if let Some(date) = &cert.date {
                    line.push_str(&format!(" ({date})"));
                }
                md.push_str(&line);
                md.push('\n');
            }
            md.push('\n');
        }
        Section::Other { key, data } => {
            md.push_str(&format!("## {}\n\n", humanize_key(key)));
            if let Ok(data_str) = serde_json::to_string_pretty(data) {
                md.push_str("```json\n");
                md.push_str(&data_str);
                md.push_str("\n```\n\n");
            }
        }
    }
}

fn date_range(start: &Option<String>, end: &Option<String>) -> Option<String> {
    match (start, end) {
        (Some(start), Some(end)) => Some(format!("{start} – {end}")),
        (Some(start), None) => Some(format!("{start} – Present")),
        (None, Some(end)) => Some(end.clone()),
        (None, None) => None,
    }
}

/// `workExperience` / `open_source` → `Work Experience` / `Open Source`.
fn humanize_key(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch == '_' || ch == '-' {
            spaced.push(' ');
            continue;
        }
        if ch.is_uppercase() && i > 0 {
            spaced.push(' ');
        }
        spaced.push(ch);
    }
    spaced
        .split_whitespace()
        .map(|w| {
            let mut c = w.chars();
            match c.next() {
                None => String::new(),
                Some(f) => f.to_uppercase().to_string() + c.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sections::parse_document;
    use serde_json::json;

    #[test]
    fn test_humanize_key() {
        assert_eq!(humanize_key("workExperience"), "Work Experience");
        assert_eq!(humanize_key("open_source"), "Open Source");
        assert_eq!(humanize_key("awards"), "Awards");
    }

    #[test]
    fn test_renders_typed_sections_in_order() {
        let doc = parse_document(&json!({
            "skills": {"data": {"hard": ["Rust", "SQL"], "soft": []}},
            "contactInfo": {"data": {"name": "Jane Doe", "email": "jane@x.com"}},
            "workExperience": {"data": [{
                "company": "Acme",
                "title": "Engineer",
                "startDate": "2021",
                "highlights": ["Cut p99 latency by 40%"]
            }]}
        }))
        .unwrap();

        let md = render_document_to_md(&doc);

        assert!(md.starts_with("# Jane Doe\n\njane@x.com\n\n"));
        assert!(md.contains("### Engineer — Acme\n*2021 – Present*\n- Cut p99 latency by 40%\n"));
        assert!(md.contains("- **Hard:** Rust, SQL\n"));
        assert!(!md.contains("**Soft:**"));
        let work = md.find("## Work Experience").unwrap();
        let skills = md.find("## Skills").unwrap();
        assert!(work < skills);
    }

    #[test]
    fn test_unknown_section_rendered_as_json() {
        let doc = parse_document(&json!({"volunteerWork": {"data": {"org": "Food bank"}}})).unwrap();
        let md = render_document_to_md(&doc);
        assert!(md.starts_with("## Volunteer Work\n\n```json\n"));
        assert!(md.contains("\"org\": \"Food bank\""));
    }

    #[test]
    fn test_empty_document_renders_empty() {
        assert_eq!(render_document_to_md(&ResumeDocument::new()), "");
    }
}
