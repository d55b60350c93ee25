//! Prompt text for the vision model.
//!
//! The OCR text must stay in its original language; summaries and headings are
//! always English. Every prompt asks for bare JSON.

pub const ANALYSIS_SYSTEM: &str = "You are a precise vision OCR+summarizer. Rules: Only state information that is directly visible in the image (text/UI/branding/icons). Do NOT guess platform/app/tab names unless visible. Prefer concise, factual bullet points. The summary and headings MUST be in English. The raw OCR \"text\" MUST NOT be translated (keep original language). Return ONLY strict JSON without code fences.";

pub const ANALYSIS_PROMPT: &str = "Task: Analyze the screenshot.\n\
1) Extract ALL visible text as precisely as possible (OCR). Do NOT translate this OCR text; keep the original language.\n\
2) Produce a SHORT SUMMARY of 3-9 bullet points. Each bullet must be a full sentence, explaining to a reader what is visible. IMPORTANT: The summary MUST be in English. Only include facts directly visible in the image: page/section structure, headings, buttons/icons, notifications, status bar (time/battery/network), visible app or site name, active view/tab, other visible tabs, language/currency/date formats, etc. If a category is not visible, skip it. Do NOT guess.\n\
3) In the \"headings\" array, extract the main VISIBLE headings (page or section titles). IMPORTANT: Headings MUST be in English (translate if needed), but remain faithful to what is visible.\n\
Return ONLY JSON: {\"text\": string, \"summary\": string[], \"headings\": string[]} with no extra text.";

pub const DESCRIPTION_SYSTEM: &str = "You are a precise vision assistant. Rules: Only state information that is directly visible in the image (text/UI/branding/icons). Do NOT guess platform/app/tab names unless visible. Be comprehensive but concise in bullets. The summary and headings MUST be in English. The raw OCR \"text\" MUST NOT be translated (keep original language). Return ONLY strict JSON without code fences.";

pub const DESCRIPTION_PROMPT: &str = "Describe the image briefly and provide a short summary of 3-9 bullets as full sentences. Only include facts directly visible (sections, UI elements, icons, notifications, status bar, visible app/site name if present, active view/tab, other visible tabs, etc.). Do NOT guess. Also extract main visible headings in the \"headings\" array. IMPORTANT: The summary and headings MUST be in English. The raw OCR \"text\" MUST NOT be translated. Return only JSON: {\"text\": \"\", \"summary\": string[], \"headings\": string[]}";

pub const EXTRACTION_SYSTEM: &str = "Extract up to 3 notable real-world entities present in the screenshot (based on visible text and the short summary). Types may include: movie, tv, book, music, product-perfume, product-electronics, product-cosmetics, product, person, game, app, website, brand, other. Only use information that is clearly visible (name/brand/model/author/year). Return ONLY strict JSON, no code fences.";

/// User prompt for entity extraction.
pub fn extraction_prompt(text: &str, summary: &str) -> String {
    format!(
        "Visible text:\n{text}\nVisible summary (bullets):\n{summary}\n\
Return JSON shape: {{\"entities\": [{{\"type\":\"movie|tv|book|music|product-perfume|product-electronics|product-cosmetics|product|person|game|app|website|brand|other\",\"name\":\"string\",\"year\":number|null,\"brand\":string|null,\"model\":string|null,\"searchQuery\":string,\"extra\":object|null}}]}}.\n\
Rules:\n\
- Choose a compact, useful searchQuery combining name + brand/model if visible (no guessing).\n\
- Do not invent data.\n\
- If multiple candidates, prefer the most prominent one (title/logo/large text)."
    )
}
