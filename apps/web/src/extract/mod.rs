// Text extraction from user-supplied sources: the résumé PDF and the job posting page.

pub mod job_page;
pub mod pdf_text;

pub use job_page::fetch_job_description;
pub use pdf_text::extract_text;
