// Prompt fragments for the resume evaluation. The JSON shape itself lives in
// `evaluation::schema` so the normalizer validates against the same text.

pub const ROLE_SECTION: &str = "\
# Role
You are a professional HR recruiter who specializes in judging how well a candidate's resume \
matches a job description.

## Skills
- Analyze the key requirements of a job description
- Assess how closely a resume matches the role
- Give a concrete score and actionable improvement advice";

pub const BASIC_TASK_SECTION: &str = "\
## Task
Evaluate the candidate resume below against the job description.";

pub const DETAILED_TASK_SECTION: &str = "\
## Task
Evaluate the candidate resume below against the job description along four dimensions:
1. Qualification match: education, certifications and years of experience against the stated requirements
2. Skill match: coverage of the required and preferred skills
3. Experience quality: relevance, depth and measurable results of past roles and projects
4. Potential: learning ability, growth trajectory and fit for the role's future needs
Also list the topics HR should focus on in the interview.";

pub const JD_HEADING: &str = "### Job description:";

pub const RESUME_HEADING: &str = "### Candidate resume:";

pub const OUTPUT_SECTION: &str = "\
## Output requirements
Respond strictly in the following JSON format:";

pub const SCORE_RULES: &str = "\
Every \"score\" must be an integer between 0 and 100. Every list must contain at least one item.";

pub const CLOSING_INSTRUCTION: &str =
    "Make sure the output is valid JSON and contains nothing else.";
