// Prompt template for the cover letter completion.

/// Characters of each source text embedded in the prompt.
pub const SOURCE_CHAR_BUDGET: usize = 2000;

/// Cover letter prompt template.
/// Replace: {resume_text}, {job_description}, {today}, {closing_instruction}
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Create a professional, ATS-optimized cover letter based on the following resume and job description.

RESUME:
{resume_text}

JOB DESCRIPTION:
{job_description}

Instructions:
1. Create a formal, well-structured cover letter
2. Match relevant skills and experiences from the resume to the job requirements
3. Use a professional tone and format
4. Include a compelling introduction, 2-3 paragraphs for the body, and a confident closing
5. Make it ATS-friendly by including relevant keywords from the job description
6. Keep it under 400 words
7. Format it as a business letter dated {today}, opening with "Dear Hiring Manager,"

{closing_instruction}"#;
