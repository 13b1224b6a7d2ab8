//! Prompt construction for the analysis request.
//!
//! Keep the prompt compact but explicit: the model must return one JSON
//! object matching the [`crate::record::AnalysisRecord`] schema, with code
//! snippets sanitized so the values stay parseable (literal `\n`/`\t` tokens,
//! no raw control characters, no unescaped quotes).

/// System instruction sent with every invocation.
pub const SYSTEM_PROMPT: &str = "You are an expert SQL database optimizer. Your responses must be \
    valid, properly escaped JSON without any special characters or line breaks in JSON string \
    values. Always format code snippets by replacing newlines with \\n, tabs with \\t, and using \
    single quotes instead of double quotes whenever possible.";

/// Expected reply shape, shown to the model verbatim.
const OUTPUT_SCHEMA: &str = r#"{
    "procedure_name": "name of the procedure",
    "complexity": "complexity level",
    "scope": "brief description",
    "optimizations": [
        {
            "type": "type of optimization",
            "line_number": "specific line number range (e.g., '15-20')",
            "existing_logic": "simplified code with newlines as \n",
            "optimized_logic": "simplified code with newlines as \n",
            "explanation": "explanation of benefits"
        }
    ],
    "summary": {
        "original_performance_issues": "key issues overview",
        "optimization_impact": "estimated impact",
        "implementation_difficulty": "difficulty assessment"
    }
}"#;

/// Builds the full analysis instruction for one stored procedure.
///
/// Pure string assembly; the only failure mode (input too large for the
/// transport) belongs to the caller.
pub fn build_analysis_prompt(sql: &str) -> String {
    let mut s = String::with_capacity(sql.len() + 2048);
    s.push_str(
        "Analyze the following SQL stored procedure in its entirety and return your analysis \
         in JSON format:\n\n",
    );
    s.push_str(sql);
    s.push_str("\n\n");
    s.push_str(
        "You are an expert in SQL performance optimization. Thoroughly analyze the stored \
         procedure and identify the most significant optimization opportunities specific to \
         this code. Focus on optimizations that would result in meaningful performance \
         improvements.\n\n",
    );
    s.push_str(
        "Extract and provide:\n\
         1. The name of the stored procedure\n\
         2. The complexity level of the query that needs to be optimized\n\
         3. The scope/purpose of the stored procedure with details of 4-5 lines\n\
         4. Key optimization opportunities\n\n",
    );
    s.push_str(
        "For each optimization opportunity:\n\
         - Provide a clear, descriptive name for the type of optimization\n\
         - IMPORTANT: Indicate the EXACT line number range in the code where this optimization \
         applies (e.g., \"15-20\", \"32-45\"). Do NOT use generic terms like \"Entire procedure\" \
         or \"Throughout the procedure\"\n\
         - Include the existing code snippet (SIMPLIFIED AND SANITIZED for JSON)\n\
         - Provide the improved code snippet (SIMPLIFIED AND SANITIZED for JSON)\n\
         - Explain the performance benefit and why this change would be impactful\n\n",
    );
    s.push_str(
        "EXTREMELY IMPORTANT JSON FORMATTING INSTRUCTIONS:\n\
         1. ALL CODE SNIPPETS MUST BE SIMPLE TEXT WITHOUT SPECIAL FORMATTING\n\
         2. Replace all double quotes in code with single quotes\n\
         3. Replace all newlines in code with the literal string \"\\n\"\n\
         4. Replace all tabs with the literal string \"\\t\"\n\
         5. Replace all backslashes with double backslashes \"\\\\\"\n\
         6. DO NOT include any raw newlines, tabs, or unescaped quotes in JSON values\n\
         7. Keep code examples simple and focus on the key changes\n\n",
    );
    s.push_str("Output format:\n");
    s.push_str(OUTPUT_SCHEMA);
    s.push_str("\n\n");
    s.push_str(
        "FINAL INSTRUCTIONS:\n\
         1. Your response must contain ONLY valid JSON.\n\
         2. Do NOT include backticks or JSON code block markers.\n\
         3. All string values must be properly escaped for JSON.\n\
         4. Use simple, sanitized code examples without complex formatting.\n\
         5. Double-check that your JSON response will parse correctly before returning it.\n\
         6. For each optimization, always provide specific line number ranges, never general \
         locations.\n\n",
    );
    s.push_str(
        "Consider these optimization strategies if applicable:\n\
         1) Index usage optimization\n\
         2) Remove redundant DISTINCT/UNION operations\n\
         3) Replace row-by-row processing with set-based operations\n\
         4) Consolidate NOCOUNT usage\n\
         5) Use CTEs instead of nested loops for parsing\n\
         6) Replace SELECT * with specific columns\n\
         7) Minimize dynamic SQL usage\n\
         8) Use temporary tables instead of cursors\n",
    );
    s
}
