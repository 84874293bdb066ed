//! 基于词典和规则的情感打分
//!
//! 输出 [-1, 1] 区间内的复合情感分。规则：
//!
//! 1. 词典查值（英文，偏向问诊场景的用词）
//! 2. 前三个词内的否定词翻转并衰减
//! 3. 程度副词增强/减弱，距离越远影响越小
//! 4. 全大写强调（只在句子大小写混用时生效）
//! 5. `but` 之前的情感减半，之后的加权 1.5 倍
//! 6. 感叹号放大，问号略微放大
//! 7. `x / sqrt(x² + 15)` 归一化

use once_cell::sync::Lazy;
use std::collections::HashMap;

const NEGATION_SCALAR: f64 = -0.74;
const BOOST_INCREMENT: f64 = 0.293;
const CAPS_INCREMENT: f64 = 0.733;
const EXCLAMATION_INCREMENT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const QUESTION_INCREMENT: f64 = 0.18;
const MAX_QUESTION_EMPHASIS: f64 = 0.96;
const NORMALIZATION_ALPHA: f64 = 15.0;

/// (词, 情感值)，情感值范围约为 [-4, 4]
const VALENCE_TABLE: &[(&str, f64)] = &[
    // positive
    ("alright", 1.0),
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("best", 3.2),
    ("better", 1.9),
    ("calm", 1.3),
    ("cheerful", 2.5),
    ("comfortable", 1.6),
    ("confident", 2.2),
    ("energetic", 1.9),
    ("enjoy", 2.2),
    ("enjoying", 2.4),
    ("excellent", 2.7),
    ("excited", 1.4),
    ("fantastic", 2.6),
    ("fine", 0.8),
    ("fun", 2.3),
    ("glad", 2.0),
    ("good", 1.9),
    ("grateful", 2.0),
    ("great", 3.1),
    ("happy", 2.7),
    ("healthy", 1.7),
    ("helpful", 1.8),
    ("hope", 1.9),
    ("hopeful", 2.3),
    ("improved", 2.1),
    ("improving", 1.8),
    ("joy", 2.8),
    ("love", 3.2),
    ("lucky", 1.8),
    ("nice", 1.8),
    ("ok", 1.2),
    ("okay", 0.9),
    ("peaceful", 2.2),
    ("perfect", 2.7),
    ("pleased", 1.9),
    ("positive", 2.6),
    ("relaxed", 2.2),
    ("relief", 2.1),
    ("relieved", 1.5),
    ("rested", 1.3),
    ("safe", 1.9),
    ("strong", 2.3),
    ("thank", 1.5),
    ("thanks", 1.9),
    ("wonderful", 2.7),
    ("yes", 1.7),
    // negative
    ("ache", -1.6),
    ("aches", -1.6),
    ("aching", -1.5),
    ("afraid", -2.0),
    ("agony", -2.6),
    ("angry", -2.3),
    ("annoyed", -1.6),
    ("anxiety", -0.7),
    ("anxious", -1.0),
    ("awful", -2.0),
    ("bad", -2.5),
    ("broken", -1.8),
    ("confused", -1.3),
    ("cry", -2.1),
    ("crying", -2.1),
    ("depressed", -2.3),
    ("depressing", -1.6),
    ("difficult", -1.5),
    ("disgusted", -2.4),
    ("disgusting", -2.4),
    ("dizzy", -0.9),
    ("dying", -2.9),
    ("exhausted", -1.5),
    ("exhausting", -1.5),
    ("fear", -2.2),
    ("frustrated", -2.2),
    ("hate", -2.7),
    ("hopeless", -2.0),
    ("horrible", -2.5),
    ("hurt", -2.4),
    ("hurts", -2.2),
    ("ill", -1.8),
    ("lonely", -2.0),
    ("mad", -2.2),
    ("miserable", -2.2),
    ("nauseous", -1.5),
    ("nervous", -1.2),
    ("overwhelmed", -1.5),
    ("pain", -2.3),
    ("painful", -2.3),
    ("panic", -2.3),
    ("poor", -2.1),
    ("problem", -1.7),
    ("problems", -1.7),
    ("sad", -2.1),
    ("scared", -1.9),
    ("sick", -2.3),
    ("sore", -1.2),
    ("stress", -1.8),
    ("stressed", -1.4),
    ("struggling", -1.6),
    ("suffering", -2.1),
    ("terrible", -2.1),
    ("terrified", -3.0),
    ("tired", -1.9),
    ("trouble", -1.7),
    ("unhappy", -1.8),
    ("unwell", -1.7),
    ("upset", -1.6),
    ("weak", -1.9),
    ("worried", -1.2),
    ("worry", -1.9),
    ("worse", -2.1),
    ("worst", -3.1),
    ("wrong", -2.1),
];

const NEGATIONS: &[&str] = &[
    "ain't", "aint", "aren't", "arent", "can't", "cannot", "cant", "couldn't", "didn't", "didnt",
    "doesn't", "doesnt", "don't", "dont", "hadn't", "hardly", "hasn't", "haven't", "isn't", "isnt",
    "neither", "never", "no", "nobody", "none", "nor", "not", "nothing", "nowhere", "rarely",
    "seldom", "shouldn't", "wasn't", "weren't", "without", "won't", "wont", "wouldn't",
];

/// (程度副词, 增量)
const BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", BOOST_INCREMENT),
    ("completely", BOOST_INCREMENT),
    ("extremely", BOOST_INCREMENT),
    ("incredibly", BOOST_INCREMENT),
    ("really", BOOST_INCREMENT),
    ("so", BOOST_INCREMENT),
    ("terribly", BOOST_INCREMENT),
    ("totally", BOOST_INCREMENT),
    ("very", BOOST_INCREMENT),
    ("barely", -BOOST_INCREMENT),
    ("kinda", -BOOST_INCREMENT),
    ("marginally", -BOOST_INCREMENT),
    ("occasionally", -BOOST_INCREMENT),
    ("slightly", -BOOST_INCREMENT),
    ("somewhat", -BOOST_INCREMENT),
];

static LEXICON: Lazy<HashMap<&'static str, f64>> =
    Lazy::new(|| VALENCE_TABLE.iter().copied().collect());

static BOOSTER_MAP: Lazy<HashMap<&'static str, f64>> =
    Lazy::new(|| BOOSTERS.iter().copied().collect());

/// 计算复合情感分
pub fn compound_score(text: &str) -> f64 {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return 0.0;
    }

    let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
    let caps_differential = has_caps_differential(&tokens);

    let mut sentiments: Vec<f64> = Vec::with_capacity(tokens.len());
    for (i, word) in lowered.iter().enumerate() {
        let Some(&base) = LEXICON.get(word.as_str()) else {
            sentiments.push(0.0);
            continue;
        };

        let mut valence = base;
        if caps_differential && is_shouted(&tokens[i]) {
            valence += CAPS_INCREMENT * valence.signum();
        }

        for distance in 1..=3 {
            if i < distance {
                break;
            }
            let previous = lowered[i - distance].as_str();
            if let Some(&increment) = BOOSTER_MAP.get(previous) {
                let decay = match distance {
                    1 => 1.0,
                    2 => 0.95,
                    _ => 0.9,
                };
                valence += increment * valence.signum() * decay;
            }
            if NEGATIONS.contains(&previous) {
                valence *= NEGATION_SCALAR;
            }
        }

        sentiments.push(valence);
    }

    apply_but_rule(&lowered, &mut sentiments);

    let mut sum: f64 = sentiments.iter().sum();
    if sum != 0.0 {
        sum += punctuation_emphasis(text) * sum.signum();
    }

    normalize(sum)
}

fn tokenize(text: &str) -> Vec<String> {
    text.replace('\u{2019}', "'")
        .split_whitespace()
        .map(|raw| raw.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// 至少两个字母且全部大写
fn is_shouted(token: &str) -> bool {
    let letters: Vec<char> = token.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

/// 句子中有部分（而非全部）词是全大写
fn has_caps_differential(tokens: &[String]) -> bool {
    let shouted = tokens.iter().filter(|t| is_shouted(t)).count();
    shouted > 0 && shouted < tokens.len()
}

fn apply_but_rule(lowered: &[String], sentiments: &mut [f64]) {
    let Some(pivot) = lowered.iter().position(|w| w == "but") else {
        return;
    };
    for (i, value) in sentiments.iter_mut().enumerate() {
        if i < pivot {
            *value *= 0.5;
        } else if i > pivot {
            *value *= 1.5;
        }
    }
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS);
    let questions = text.matches('?').count();
    let question_emphasis = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * QUESTION_INCREMENT,
        _ => MAX_QUESTION_EMPHASIS,
    };
    exclamations as f64 * EXCLAMATION_INCREMENT + question_emphasis
}

fn normalize(score: f64) -> f64 {
    let normalized = score / (score * score + NORMALIZATION_ALPHA).sqrt();
    normalized.clamp(-1.0, 1.0)
}
