//! Prompts for job-description parsing, in both shipped languages.

use crate::jobparse::Language;

pub const JOB_PARSE_SYSTEM_EN: &str = r#"You are an expert HR professional and job description analyst. Your task is to extract structured information from a job description and organize it into specific fields.

Analyze the description and extract:
1. Job title
2. General job description
3. Required skills (hard skills and soft skills)
4. Preferred skills
5. Educational requirements
6. Experience level (entry/mid/senior/lead)
7. Industry
8. Location
9. Specific responsibilities
10. Additional requirements
11. Benefits offered

Respond in JSON format with the following structure:
{
  "title": "string",
  "description": "string",
  "requiredSkills": ["string"],
  "preferredSkills": ["string"],
  "education": ["string"],
  "experienceLevel": "entry|mid|senior|lead",
  "industry": "string",
  "location": "string",
  "responsibilities": ["string"],
  "requirements": ["string"],
  "benefits": ["string"]
}"#;

pub const JOB_PARSE_SYSTEM_ES: &str = r#"Eres un experto en recursos humanos y análisis de descripciones de trabajo. Tu tarea es extraer información estructurada de una descripción de trabajo y organizarla en campos específicos.

Analiza la descripción y extrae:
1. Título del puesto
2. Descripción general del trabajo
3. Habilidades requeridas (hard skills y soft skills)
4. Habilidades preferidas
5. Requisitos educativos
6. Nivel de experiencia (entry/mid/senior/lead)
7. Industria
8. Ubicación
9. Responsabilidades específicas
10. Requisitos adicionales
11. Beneficios ofrecidos

Responde en formato JSON con la siguiente estructura:
{
  "title": "string",
  "description": "string",
  "requiredSkills": ["string"],
  "preferredSkills": ["string"],
  "education": ["string"],
  "experienceLevel": "entry|mid|senior|lead",
  "industry": "string",
  "location": "string",
  "responsibilities": ["string"],
  "requirements": ["string"],
  "benefits": ["string"]
}"#;

pub fn system_prompt(language: Language) -> &'static str {
    match language {
        Language::En => JOB_PARSE_SYSTEM_EN,
        Language::Es => JOB_PARSE_SYSTEM_ES,
    }
}

pub fn build_parse_prompt(job_text: &str) -> String {
    format!(
        "Job Description:\n{job_text}\n\n\
         Please analyze this job description and extract the structured information in the specified JSON format."
    )
}
