// Resume parsing prompt templates.

pub const RESUME_PARSE_SYSTEM: &str = "\
You are a precise resume data extractor. \
Split a resume into its sections and return them as structured JSON. \
You MUST respond with valid JSON only: no markdown fences, no explanations. \
Copy the candidate's wording; do not invent or embellish details.";

pub const RESUME_PARSE_PROMPT: &str = r#"Parse the following resume into a JSON object keyed by section.

RESUME TEXT:
{resume_text}

OUTPUT SCHEMA (return exactly this structure, omitting sections that are absent):
{
  "contactInfo":    {"data": {"name": "string", "email": "string" | null, "phone": "string" | null,
                              "location": "string" | null, "linkedin": "string" | null, "website": "string" | null}},
  "summary":        {"data": "string"},
  "workExperience": {"data": [{"company": "string", "title": "string", "location": "string" | null,
                               "startDate": "string" | null, "endDate": "string" | null,
                               "highlights": ["string"]}]},
  "education":      {"data": [{"institution": "string", "degree": "string" | null, "field": "string" | null,
                               "startDate": "string" | null, "endDate": "string" | null, "gpa": "string" | null}]},
  "skills":         {"data": {"<group name, e.g. hard, soft, languages>": ["string"]}},
  "projects":       {"data": [{"name": "string", "description": "string" | null,
                               "technologies": ["string"], "url": "string" | null}]},
  "certifications": {"data": [{"name": "string", "issuer": "string" | null, "date": "string" | null}]}
}

Any other section (awards, publications, volunteering, ...) goes under its own camelCase key
as {"data": <whatever shape fits>}."#;
