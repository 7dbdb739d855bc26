//! Rule-based advisory classifier — the deterministic fallback behind every
//! chat reply.
//!
//! An ordered table of (keyword set, reply) rules is scanned top to bottom;
//! the first rule with any keyword contained in the lowercased message wins.
//! The table order is load-bearing: several keyword sets overlap ("hives"
//! appears under both rash and allergy, "baby" under both pregnancy and
//! child, and the broad pain set shadows later categories), so reordering
//! rules changes observable replies. Keep new rules at the end unless the
//! overlap is understood.
//!
//! Classification is a pure function of (message, context) — no I/O, no
//! shared state, never fails. Unmatched input gets [`FALLBACK_ADVICE`].

use super::UserContext;

/// A single advisory rule.
struct Rule {
    /// Short tag used by tests and trace logging.
    topic: &'static str,
    /// Matched when any member is a substring of the lowercased message.
    keywords: &'static [&'static str],
    reply: Reply,
}

enum Reply {
    /// Fixed advisory text.
    Text(&'static str),
    /// Personalized greeting interpolating the patient's location.
    Greeting,
}

impl Reply {
    fn render(&self, ctx: &UserContext) -> String {
        match self {
            Reply::Text(text) => (*text).to_string(),
            Reply::Greeting => format!(
                "Hello! I'm Dr. Alistair Finch. How are you feeling today? Please describe \
                 any symptoms or concerns you have, and I'll do my best to provide helpful \
                 guidance. I understand you're in {}. Remember, I can provide general health \
                 guidance, but for serious conditions, please seek professional medical care.",
                ctx.location
            ),
        }
    }
}

/// Advisory returned when no rule matches.
pub const FALLBACK_ADVICE: &str =
    "Thank you for sharing your health concern. I recommend consulting with a healthcare \
     professional for proper evaluation and treatment. I can provide general health guidance, \
     but remember that I'm not a substitute for proper medical diagnosis and treatment. \
     For serious conditions, persistent symptoms, or if you're experiencing severe pain, \
     difficulty breathing, chest pain, or other emergency symptoms, please seek professional \
     care immediately. Always follow up with qualified healthcare providers who can examine \
     you and provide personalized treatment plans.";

/// Classify `message` and return the advisory text for the first matching rule.
///
/// Case-insensitive; deterministic; returns [`FALLBACK_ADVICE`] when nothing
/// matches (including the empty message).
pub fn classify(message: &str, ctx: &UserContext) -> String {
    let lower = message.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| lower.contains(kw)))
        .map(|rule| rule.reply.render(ctx))
        .unwrap_or_else(|| FALLBACK_ADVICE.to_string())
}

/// Topic tag of the rule `message` would hit, if any. Used for trace logging
/// and rule-level tests; `None` means the fallback applies.
pub(crate) fn matched_topic(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| lower.contains(kw)))
        .map(|rule| rule.topic)
}

// ── Rule table ───────────────────────────────────────────────────────────────
// Evaluated strictly in declaration order; first match wins.

const RULES: &[Rule] = &[
    Rule {
        topic: "fever",
        keywords: &[
            "fever", "temperature", "hot", "cold", "chills", "sweat", "feeling hot",
            "feeling cold",
        ],
        reply: Reply::Text(
            "Based on your reported symptoms, it sounds like you may have a fever. \
             I recommend staying hydrated, resting, and monitoring your temperature. \
             Apply cool, damp cloths to your forehead and take lukewarm baths to help \
             reduce fever. If your fever is high (above 38.5\u{b0}C/101.3\u{b0}F), persists for \
             more than 2 days, or is accompanied by severe symptoms like difficulty \
             breathing, persistent vomiting, or confusion, please seek immediate medical \
             attention at a local clinic.",
        ),
    },
    Rule {
        topic: "headache",
        keywords: &["headache", "pain", "hurt", "ach", "sore", "throbbing", "pounding"],
        reply: Reply::Text(
            "For headaches, I recommend resting in a quiet, dark room and staying hydrated. \
             Apply a cold or warm compress to your forehead or neck depending on what feels \
             better. Over-the-counter pain relievers like paracetamol can help, but follow \
             package instructions. Avoid bright lights, loud noises, and strong smells. \
             If the headache is severe, sudden, accompanied by fever, stiff neck, rash, or \
             vision changes, or if it's the worst headache you've ever experienced, please \
             see a healthcare professional immediately.",
        ),
    },
    Rule {
        topic: "stomach",
        keywords: &[
            "stomach", "belly", "nausea", "vomit", "diarrhea", "loose motion",
            "upset stomach", "stomach ache",
        ],
        reply: Reply::Text(
            "For stomach issues, stay hydrated with clean water, oral rehydration solutions, \
             or clear broths. Follow the BRAT diet (bananas, rice, applesauce, toast) \
             initially, then gradually return to normal foods. Eat small, frequent meals \
             instead of large ones. Avoid fatty, spicy, dairy, caffeine, and alcohol. \
             Rest and avoid solid foods for a few hours if vomiting occurs, then slowly \
             reintroduce clear liquids. If vomiting or diarrhea persists for more than 24 \
             hours, you show signs of dehydration (dry mouth, dizziness, little urination), \
             or you experience severe abdominal pain, blood in vomit/stool, or high fever, \
             seek immediate medical care.",
        ),
    },
    Rule {
        topic: "respiratory",
        keywords: &[
            "cough", "cold", "sneeze", "sore throat", "throat", "runny nose", "stuffy nose",
        ],
        reply: Reply::Text(
            "For coughs and colds, rest well and drink plenty of fluids like water, herbal \
             teas, or clear broths. Gargle with warm salt water to soothe a sore throat. \
             Use a humidifier or take steamy showers to ease congestion. Honey in warm \
             water or tea can help soothe coughs (not for children under 1 year). \
             Over-the-counter cough drops or pain relievers may provide relief. If you \
             have difficulty breathing, chest pain, persistent fever above 38.5\u{b0}C/101.3\u{b0}F, \
             cough lasting more than 2 weeks, or symptoms worsen, please consult with a \
             healthcare provider.",
        ),
    },
    Rule {
        topic: "chest",
        keywords: &[
            "chest pain", "chest tightness", "difficulty breathing", "short of breath",
            "wheezing", "breathing problem",
        ],
        reply: Reply::Text(
            "Chest pain and breathing difficulties can be serious symptoms requiring \
             immediate medical attention. If you're experiencing severe chest pain, \
             especially if it radiates to your arm, neck, or jaw, or if you have severe \
             difficulty breathing, dizziness, or sudden onset of these symptoms, seek \
             emergency medical care immediately. For milder symptoms, monitor closely and \
             see a healthcare provider as soon as possible to determine the cause, which \
             could range from heart issues to respiratory problems.",
        ),
    },
    Rule {
        topic: "skin",
        keywords: &["rash", "itchy", "skin", "red spots", "hives", "bumps", "swelling"],
        reply: Reply::Text(
            "For skin rashes, avoid scratching and keep the area clean and dry. Apply cool \
             compresses or calamine lotion to soothe itching. Take antihistamines if \
             appropriate and not contraindicated by other conditions. Avoid known irritants \
             and allergens. If the rash spreads rapidly, is accompanied by fever, breathing \
             difficulties, or if it appears infected (pus, warmth, red streaking), seek \
             medical attention immediately. Also see a healthcare provider if the rash \
             doesn't improve after a few days of home care.",
        ),
    },
    Rule {
        topic: "musculoskeletal",
        keywords: &[
            "joint pain", "joint ache", "arthritis", "stiff joints", "swollen joints",
            "muscle pain",
        ],
        reply: Reply::Text(
            "For joint or muscle pain, rest the affected area and apply ice for the first \
             48 hours to reduce swelling, then use heat to relax muscles and improve blood \
             flow. Gentle stretching and movement can help maintain flexibility. \
             Over-the-counter pain relievers like ibuprofen or paracetamol may help, \
             following package instructions. Maintain a healthy weight to reduce stress on \
             joints. If pain persists for more than a week, is severe, accompanied by \
             swelling, redness, warmth, or if you have difficulty moving the joint, consult \
             a healthcare provider.",
        ),
    },
    Rule {
        topic: "dizziness",
        keywords: &["dizziness", "lightheaded", "faint", "spinning", "balance", "vertigo"],
        reply: Reply::Text(
            "For dizziness, sit or lie down immediately to prevent falls. Stay hydrated and \
             get up slowly from sitting or lying positions. Avoid sudden head movements and \
             bright lights. If dizziness is accompanied by chest pain, difficulty breathing, \
             severe headache, numbness, weakness, or difficulty speaking, seek emergency \
             care immediately. For persistent or recurring dizziness, see a healthcare \
             provider to determine the cause.",
        ),
    },
    Rule {
        topic: "abdominal",
        keywords: &["abdominal pain", "stomach ache", "belly pain", "cramps", "stomach cramps"],
        reply: Reply::Text(
            "For abdominal pain, try to identify any triggers like food, stress, or \
             activity. Apply a warm compress to the area for relief. Stay hydrated and eat \
             small, bland meals. Avoid foods that worsen the pain. If pain is severe, \
             localized to one area, accompanied by fever, vomiting, blood in stool, or if \
             pain came on suddenly and is very intense, seek immediate medical attention. \
             Also see a healthcare provider if pain persists for more than 24 hours or \
             keeps recurring.",
        ),
    },
    Rule {
        topic: "fatigue",
        keywords: &["fatigue", "tired", "exhausted", "weak", "low energy", "sleepy"],
        reply: Reply::Text(
            "For fatigue, ensure you're getting adequate sleep (7-9 hours for most adults), \
             eating a balanced diet, and staying hydrated. Regular, moderate exercise can \
             actually help reduce fatigue. Manage stress through relaxation techniques. \
             If fatigue persists despite adequate rest, is severe, or is accompanied by \
             other symptoms like unexplained weight loss, fever, or weakness, consult a \
             healthcare provider as it could indicate an underlying condition.",
        ),
    },
    Rule {
        topic: "back",
        keywords: &["back pain", "lower back", "upper back", "spine pain", "back ache"],
        reply: Reply::Text(
            "For back pain, apply heat or ice to the affected area for 15-20 minutes \
             several times a day. Maintain good posture and avoid heavy lifting. Gentle \
             stretching and walking may help. Over-the-counter pain relievers can provide \
             temporary relief. Sleep with a pillow between your knees (if lying on your \
             side) or under your knees (if on your back). If pain is severe, persists for \
             more than a week, is accompanied by numbness or weakness in legs, or if you \
             have difficulty controlling bladder or bowels, seek immediate medical \
             attention.",
        ),
    },
    Rule {
        topic: "sleep",
        keywords: &["sleep", "insomnia", "can't sleep", "trouble sleeping", "sleeping problem"],
        reply: Reply::Text(
            "For sleep problems, maintain a regular sleep schedule and create a comfortable \
             sleep environment. Avoid caffeine, large meals, and screens at least 2 hours \
             before bedtime. Try relaxation techniques like deep breathing or meditation. \
             Keep the bedroom cool, dark, and quiet. If sleep problems persist for more \
             than 2-3 weeks, significantly impact your daily life, or are accompanied by \
             other concerning symptoms, consult a healthcare provider.",
        ),
    },
    Rule {
        topic: "greeting",
        keywords: &["hello", "hi", "good morning", "good afternoon", "good evening", "greetings"],
        reply: Reply::Greeting,
    },
    Rule {
        topic: "gratitude",
        keywords: &["thank", "thanks", "appreciate", "grateful", "appreciated"],
        reply: Reply::Text(
            "You're very welcome! I'm here to help. If you have any other questions or \
             concerns, please feel free to ask. Remember to consult with healthcare \
             professionals for serious conditions or persistent symptoms.",
        ),
    },
    Rule {
        topic: "help",
        keywords: &["help", "assist", "problem", "issue", "concern", "worried"],
        reply: Reply::Text(
            "I'm here to help. Please describe your symptoms or health concern in detail. \
             I can provide general health guidance, but remember that I'm not a substitute \
             for proper medical diagnosis and treatment. For serious conditions, persistent \
             symptoms, or if you're experiencing severe pain, difficulty breathing, chest \
             pain, or other emergency symptoms, please seek immediate professional medical \
             care.",
        ),
    },
    Rule {
        topic: "medication",
        keywords: &["medicine", "medication", "prescription", "drug", "treatment"],
        reply: Reply::Text(
            "I cannot provide prescriptions or specific medication advice. Only licensed \
             healthcare professionals can prescribe medications after proper evaluation. \
             If you need medication, please consult with a healthcare provider who can \
             assess your condition and prescribe appropriate treatment. For \
             over-the-counter medications, follow package instructions and consult a \
             pharmacist if you have questions about interactions or appropriateness for \
             your condition.",
        ),
    },
    Rule {
        topic: "pregnancy",
        keywords: &["pregnant", "pregnancy", "expecting", "baby", "conceiving"],
        reply: Reply::Text(
            "Pregnancy-related health concerns require specialized medical care. If you're \
             pregnant or suspect you might be, please consult with an obstetrician or \
             healthcare provider who can provide appropriate prenatal care. Avoid taking \
             any medications without medical approval, maintain a healthy diet, take \
             prenatal vitamins, and avoid harmful substances like alcohol and tobacco. \
             Seek immediate medical attention for severe symptoms like heavy bleeding, \
             severe abdominal pain, or signs of preterm labor.",
        ),
    },
    Rule {
        topic: "pediatric",
        keywords: &["child", "children", "kid", "infant", "baby", "pediatric"],
        reply: Reply::Text(
            "Children have different health needs and medication dosages than adults. \
             For pediatric concerns, please consult with a pediatrician or healthcare \
             provider who specializes in children's health. Some symptoms that might be \
             minor in adults can be serious in children. Seek immediate medical attention \
             for infants under 3 months with fever, persistent crying, difficulty \
             breathing, or feeding problems.",
        ),
    },
    Rule {
        topic: "geriatric",
        keywords: &["elderly", "old", "aging", "senior", "aged"],
        reply: Reply::Text(
            "Older adults may have different health considerations and medication \
             sensitivities. If you're caring for an elderly person or are elderly \
             yourself, be aware that symptoms might present differently than in younger \
             adults. Pay special attention to changes in mental status, falls, medication \
             interactions, and chronic condition management. Regular check-ups with \
             healthcare providers are important for preventive care and early detection \
             of health issues.",
        ),
    },
    Rule {
        topic: "emergency",
        keywords: &["emergency", "urgent", "911", "ambulance", "hospital"],
        reply: Reply::Text(
            "If you're experiencing a medical emergency such as severe chest pain, \
             difficulty breathing, severe bleeding, loss of consciousness, signs of stroke \
             (facial drooping, arm weakness, speech difficulty), severe allergic reaction, \
             or severe injury, call emergency services immediately (911 or your local \
             emergency number). Do not delay seeking emergency care while waiting for \
             medical advice. Emergency services can provide life-saving care during \
             transport to the hospital.",
        ),
    },
    Rule {
        topic: "allergy",
        keywords: &["allergy", "allergic", "reaction", "anaphylaxis", "hives"],
        reply: Reply::Text(
            "For mild allergic reactions like localized hives or itching, antihistamines \
             may help. Avoid the known allergen if possible. For severe allergic reactions \
             (difficulty breathing, swelling of face/throat, rapid pulse, dizziness), this \
             is a medical emergency. Use an epinephrine auto-injector if available and \
             call emergency services immediately. Always carry prescribed epinephrine if \
             you have known severe allergies.",
        ),
    },
    Rule {
        topic: "diabetes",
        keywords: &["diabetes", "blood sugar", "insulin", "glucose"],
        reply: Reply::Text(
            "Diabetes management requires careful monitoring and medical supervision. \
             If you have diabetes, monitor your blood sugar as directed by your healthcare \
             provider. Take medications as prescribed and maintain a consistent eating \
             schedule. If you experience symptoms of low blood sugar (shakiness, sweating, \
             confusion) consume fast-acting carbohydrates. For high blood sugar symptoms \
             (excessive thirst, frequent urination, fatigue), stay hydrated and contact \
             your healthcare provider. Seek immediate medical attention for severe \
             symptoms like difficulty breathing, fruity-smelling breath, or altered \
             consciousness.",
        ),
    },
    Rule {
        topic: "cardiac",
        keywords: &["heart", "cardiac", "blood pressure", "hypertension", "cardiovascular"],
        reply: Reply::Text(
            "Heart health is crucial. If you have known heart conditions, take medications \
             as prescribed and follow your healthcare provider's recommendations. For \
             symptoms like chest pain, shortness of breath, irregular heartbeat, or severe \
             fatigue, seek immediate medical attention. Maintain a heart-healthy lifestyle \
             with regular exercise, a balanced diet low in sodium and saturated fats, and \
             stress management. Monitor blood pressure as recommended by your healthcare \
             provider.",
        ),
    },
    Rule {
        topic: "mental-health",
        keywords: &["mental health", "depression", "anxiety", "stress", "suicide", "mental"],
        reply: Reply::Text(
            "Mental health is as important as physical health. If you're experiencing \
             persistent sadness, anxiety, overwhelming stress, or thoughts of self-harm, \
             please reach out to mental health professionals, counselors, or crisis \
             helplines immediately. Many communities have mental health resources and \
             hotlines. Don't hesitate to seek help - mental health conditions are \
             treatable. If you're having thoughts of self-harm, please contact emergency \
             services or a crisis hotline immediately.",
        ),
    },
];
