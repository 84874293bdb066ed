//! 上下文提示拼装
//!
//! 把患者话语、表情、年龄段、问诊阶段和不一致提示拼成一条发给模型的消息。
//! 段落顺序固定：话语、表情、年龄段、阶段指令、不一致提示。

use once_cell::sync::Lazy;

use crate::models::analysis::{MismatchAnalysis, MismatchType};

/// 会诊结束标记，人设指令和回复清洗共用这一个常量
pub const END_CONSULTATION_TAG: &str = "[END_CONSULTATION]";

/// 已提问次数达到该值后，要求模型给出评估而不是继续提问
pub const FORCE_ASSESSMENT_AFTER: usize = 2;

/// 不一致提示的最低强度
pub const MISMATCH_NOTE_THRESHOLD: f64 = 0.5;

/// AI 医生人设，作为系统指令随每次请求发送
pub static PERSONA_INSTRUCTION: Lazy<String> = Lazy::new(|| {
    format!(
        "You are an empathetic AI doctor conducting a live video consultation.\n\
         Listen actively, ask focused follow-up questions, give preliminary health guidance, \
         and recognize when the patient needs in-person or emergency care.\n\
         Keep every reply conversational and concise: two or three sentences, plain text, no markdown.\n\
         Each patient message comes with bracketed context about their facial expression, age group \
         and the stage of the consultation. Use it to adapt your tone, but never quote the brackets back.\n\
         Ask at most two follow-up questions in total, then give your assessment and practical recommendations.\n\
         When you have given your assessment and the patient has nothing else to raise, \
         end your reply with the exact tag {tag}.",
        tag = END_CONSULTATION_TAG
    )
});

/// 年龄段 -> 沟通指引
const AGE_GUIDANCE: [(&str, &str); 6] = [
    (
        "Child",
        "use very simple, reassuring words and suggest involving a parent or guardian",
    ),
    (
        "Teenager",
        "be friendly and non-judgmental, and respect their growing independence",
    ),
    (
        "Young Adult",
        "be direct and practical, and consider lifestyle factors such as sleep, stress and study or work",
    ),
    (
        "Adult",
        "be clear and thorough, and consider work, family and lifestyle factors",
    ),
    (
        "Middle-aged",
        "be thorough and mention age-appropriate screening where relevant",
    ),
    (
        "Senior",
        "speak slowly and clearly, be patient, and consider chronic conditions and medications",
    ),
];

/// 查年龄段指引，大小写不敏感
pub fn age_guidance(age_category: &str) -> Option<(&'static str, &'static str)> {
    let wanted = age_category.trim();
    AGE_GUIDANCE
        .iter()
        .find(|(category, _)| category.eq_ignore_ascii_case(wanted))
        .copied()
}

fn mismatch_note(mismatch: &MismatchAnalysis) -> Option<String> {
    if mismatch.confidence <= MISMATCH_NOTE_THRESHOLD {
        return None;
    }
    let emotion = &mismatch.detected_emotion;
    match mismatch.mismatch_type {
        MismatchType::None => None,
        MismatchType::PositiveWordsNegativeFace => Some(format!(
            "[Note: The patient's words sound positive, but their face looks {}. \
             They may be feeling worse than they say; gently acknowledge this and check in.]",
            emotion
        )),
        MismatchType::NegativeWordsPositiveFace => Some(format!(
            "[Note: The patient's words sound negative, but their face looks {}. \
             They may be masking discomfort or downplaying it; ask gently how they really feel.]",
            emotion
        )),
    }
}

/// 拼装发给模型的消息
pub fn compose(
    message: &str,
    emotion: &str,
    age: Option<u32>,
    age_category: Option<&str>,
    mismatch: &MismatchAnalysis,
    exchange_count: usize,
) -> String {
    let mut segments = Vec::with_capacity(5);

    segments.push(format!("Patient says: \"{}\"", message));
    segments.push(format!("[Facial expression: {}]", emotion));

    if let Some((category, guidance)) = age_category.and_then(age_guidance) {
        let segment = match age {
            Some(age) => format!("[Age group: {} (about {} years old); {}]", category, age, guidance),
            None => format!("[Age group: {}; {}]", category, guidance),
        };
        segments.push(segment);
    }

    if exchange_count >= FORCE_ASSESSMENT_AFTER {
        segments.push(format!(
            "[Consultation stage: you have already asked {} questions. Do not ask any more questions. \
             Give your assessment and recommendations now.]",
            exchange_count
        ));
    }

    if let Some(note) = mismatch_note(mismatch) {
        segments.push(note);
    }

    segments.join("\n")
}

/// 去掉回复中的结束标记，返回 (清洗后的文本, 是否包含标记)
///
/// 精确匹配，大小写敏感。
pub fn strip_end_tag(reply: &str) -> (String, bool) {
    if reply.contains(END_CONSULTATION_TAG) {
        (reply.replace(END_CONSULTATION_TAG, "").trim().to_string(), true)
    } else {
        (reply.trim().to_string(), false)
    }
}
