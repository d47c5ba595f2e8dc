//! Medical intake prompt.

/// Headings of the structured summary, in the order the model is asked to
/// cover them.
pub const SECTION_HEADERS: [&str; 5] = [
    "Chief Complaint and Presenting Symptoms",
    "Symptom Characterization",
    "Relevant Medical Context",
    "Patient Perspective and Emotional State",
    "Clinical Documentation Support",
];

const SECTION_POINTS: [&[&str]; 5] = [
    &[
        "Primary reason for seeking care",
        "Main symptoms described in patient's own words",
    ],
    &[
        "Duration and timing patterns",
        "Severity using patient's own descriptors",
        "Precipitating and alleviating factors",
        "Associated symptoms",
    ],
    &[
        "Any mentioned medications, allergies, or existing conditions",
        "Previous treatments or consultations mentioned",
        "Family history if disclosed",
    ],
    &[
        "Patient's main concerns and worries",
        "Emotional tone and affect observed",
        "Impact on daily activities and quality of life",
    ],
    &[
        "Key phrases and direct patient quotations",
        "Inconsistencies or gaps in the history",
        "Potential areas for further clarification",
    ],
];

const PREAMBLE: &str = "\
You are an AI medical intake assistant analyzing a patient's video description
of their symptoms.

CRITICAL MEDICAL DISCLAIMERS:
- You are an assistant for information organization ONLY
- You MUST NOT provide any medical diagnoses
- You MUST NOT suggest specific treatments or medications
- You MUST flag any potentially urgent symptoms for professional review
- All information should be verified by qualified healthcare providers

ANALYSIS FRAMEWORK:
Please analyze this patient video and provide a structured clinical summary
focusing on:
";

const CLOSING: &str = "\
Please structure your response using clear headings and bullet points for easy
clinical review.
";

/// Build the intake prompt around the user's request.
pub fn build_analysis_prompt(user_query: &str) -> String {
    let mut prompt = String::from(PREAMBLE);

    for (i, (header, points)) in SECTION_HEADERS.iter().zip(SECTION_POINTS).enumerate() {
        prompt.push('\n');
        prompt.push_str(&format!("{}. {}\n", i + 1, header));
        for point in points {
            prompt.push_str(&format!("   - {}\n", point));
        }
    }

    prompt.push_str("\nSPECIFIC USER REQUEST:\n");
    prompt.push_str(user_query.trim());
    prompt.push_str("\n\n");
    prompt.push_str(CLOSING);
    prompt
}
