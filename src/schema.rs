//! Declarative schema descriptors
//!
//! Each content type has a static [`Schema`] listing its canonical fields, the
//! alternate key names backends are known to use, how each field may be
//! coerced, and what it defaults to when absent. The normalizer walks these
//! descriptors; the managed backend also receives them as its response schema.

use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// A single string. Arrays and objects are joined with paragraph breaks.
    Text,
    /// A list of strings. Objects contribute their values.
    TextList,
    /// A list of strings that may also arrive as one newline-separated string.
    Lines,
    /// A whole number, clamped to the range.
    Integer { min: i64, max: i64 },
    /// Multiple-choice options; enumeration labels are stripped.
    Options,
    /// Zero-based index into the sibling `options` field.
    AnswerIndex,
    Record(&'static Schema),
    Records(&'static Schema),
}

/// What an absent field becomes. Text templates may use `{{key}}` placeholders
/// filled from the request context.
#[derive(Debug, Clone, Copy)]
pub enum Fallback {
    Required,
    Omit,
    Text(&'static str),
    List(&'static [&'static str]),
    Integer(i64),
    /// Position of the record within its parent list.
    Position,
    Record(&'static [(&'static str, &'static str)]),
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub aliases: &'static [&'static str],
    pub fallback: Fallback,
    pub min_items: usize,
    pub max_items: Option<usize>,
}

impl Field {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            aliases: &[],
            fallback: Fallback::Required,
            min_items: 0,
            max_items: None,
        }
    }

    pub const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub const fn or(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub const fn items(mut self, min: usize, max: Option<usize>) -> Self {
        self.min_items = min;
        self.max_items = max;
        self
    }

    fn response_schema(&self) -> Value {
        let string = json!({ "type": "STRING" });
        match self.kind {
            FieldKind::Text => string,
            FieldKind::TextList | FieldKind::Lines | FieldKind::Options => {
                json!({ "type": "ARRAY", "items": string })
            }
            FieldKind::Integer { .. } | FieldKind::AnswerIndex => json!({ "type": "INTEGER" }),
            FieldKind::Record(schema) => schema.response_schema(),
            FieldKind::Records(schema) => {
                json!({ "type": "ARRAY", "items": schema.response_schema() })
            }
        }
    }
}

#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [Field],
}

impl Schema {
    /// Structured-output schema in the managed backend's dialect.
    pub fn response_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in self.fields {
            properties.insert(field.name.to_string(), field.response_schema());
            if !matches!(field.fallback, Fallback::Omit) {
                required.push(Value::from(field.name));
            }
        }

        json!({
            "type": "OBJECT",
            "properties": properties,
            "required": required,
        })
    }
}

pub const NO_EXPLANATION: &str = "暂无解析";

pub static QUESTION: Schema = Schema {
    name: "question",
    fields: &[
        Field::new("id", FieldKind::Integer { min: 0, max: i64::MAX }).or(Fallback::Position),
        Field::new("question", FieldKind::Text).aliases(&[
            "question_text",
            "questionText",
            "题目",
            "问题",
        ]),
        Field::new("options", FieldKind::Options)
            .aliases(&["choices", "选项"])
            .items(2, Some(4)),
        Field::new("correctAnswerIndex", FieldKind::AnswerIndex)
            .aliases(&["answer", "correct_answer", "correctAnswer", "答案"])
            .or(Fallback::Integer(0)),
        Field::new("explanation", FieldKind::Text)
            .aliases(&["analysis", "解析"])
            .or(Fallback::Text(NO_EXPLANATION)),
    ],
};

pub static READING: Schema = Schema {
    name: "reading",
    fields: &[
        Field::new("title", FieldKind::Text).aliases(&["标题"]),
        Field::new("author", FieldKind::Text).aliases(&["作者"]).or(Fallback::Omit),
        Field::new("content", FieldKind::Text).aliases(&["article", "text", "文章", "正文"]),
        Field::new("questions", FieldKind::Records(&QUESTION))
            .aliases(&["quiz", "题目"])
            .items(1, None),
    ],
};

pub static POETRY: Schema = Schema {
    name: "poetry",
    fields: &[
        Field::new("title", FieldKind::Text).aliases(&["标题", "诗名"]),
        Field::new("author", FieldKind::Text)
            .aliases(&["poet", "作者"])
            .or(Fallback::Text("佚名")),
        Field::new("dynasty", FieldKind::Text)
            .aliases(&["朝代"])
            .or(Fallback::Text("未知")),
        Field::new("content", FieldKind::Lines)
            .aliases(&["lines", "poem", "诗句"])
            .items(1, None),
        Field::new("pinyin", FieldKind::Lines).or(Fallback::Omit),
        Field::new("translation", FieldKind::Text)
            .aliases(&["译文", "翻译"])
            .or(Fallback::Text("暂无译文")),
        Field::new("analysis", FieldKind::Text)
            .aliases(&["赏析"])
            .or(Fallback::Text("暂无赏析")),
        Field::new("tags", FieldKind::TextList)
            .aliases(&["标签"])
            .or(Fallback::List(&[])),
        Field::new("questions", FieldKind::Records(&QUESTION))
            .aliases(&["quiz", "题目"])
            .or(Fallback::List(&[])),
    ],
};

pub static CHARACTER: Schema = Schema {
    name: "character",
    fields: &[
        Field::new("char", FieldKind::Text)
            .aliases(&["character", "汉字"])
            .or(Fallback::Text("{{char}}")),
        Field::new("pinyin", FieldKind::Text)
            .aliases(&["拼音"])
            .or(Fallback::Text("unknown")),
        Field::new("radical", FieldKind::Text)
            .aliases(&["部首"])
            .or(Fallback::Text("无")),
        Field::new("strokes", FieldKind::Integer { min: 0, max: i64::MAX })
            .aliases(&["stroke_count", "strokeCount", "笔画", "笔画数"])
            .or(Fallback::Integer(0)),
        Field::new("definition", FieldKind::Text)
            .aliases(&["meaning", "释义"])
            .or(Fallback::Text("暂无释义")),
        Field::new("etymology", FieldKind::Text)
            .aliases(&["origin", "字源"])
            .or(Fallback::Text("暂无字源信息")),
        Field::new("vocabulary", FieldKind::TextList)
            .aliases(&["words", "词语"])
            .or(Fallback::List(&[])),
        Field::new("commonPhrases", FieldKind::TextList)
            .aliases(&["common_phrases", "phrases", "成语"])
            .or(Fallback::List(&[])),
    ],
};

pub static COMPOSITION_TIPS: Schema = Schema {
    name: "tips",
    fields: &[
        Field::new("time", FieldKind::Text)
            .aliases(&["时间"])
            .or(Fallback::Text("某个日子")),
        Field::new("location", FieldKind::Text)
            .aliases(&["place", "地点"])
            .or(Fallback::Text("某个地方")),
        Field::new("characters", FieldKind::Text)
            .aliases(&["people", "人物"])
            .or(Fallback::Text("主人公")),
        Field::new("event", FieldKind::Text)
            .aliases(&["事情", "事件"])
            .or(Fallback::Text("{{topic}}")),
    ],
};

pub static COMPOSITION_GUIDE: Schema = Schema {
    name: "composition_guide",
    fields: &[
        Field::new("tips", FieldKind::Record(&COMPOSITION_TIPS))
            .aliases(&["写作小锦囊"])
            .or(Fallback::Record(&[
                ("time", "某个温暖的下午"),
                ("location", "公园"),
                ("characters", "小朋友"),
                ("event", "{{topic}}"),
            ])),
        Field::new("vocabulary", FieldKind::TextList)
            .aliases(&["好词", "words"])
            .or(Fallback::List(&["快乐", "美丽", "有趣"])),
        Field::new("sampleText", FieldKind::Text)
            .aliases(&["sample_text", "sample", "范文"])
            .or(Fallback::Text("这是一个关于{{topic}}的故事。")),
    ],
};

pub static EVALUATION: Schema = Schema {
    name: "evaluation",
    fields: &[
        Field::new("score", FieldKind::Integer { min: 0, max: 100 })
            .aliases(&["评分", "分数"])
            .or(Fallback::Integer(0)),
        Field::new("comment", FieldKind::Text)
            .aliases(&["老师评语", "评语"])
            .or(Fallback::Text("")),
        Field::new("goodPoints", FieldKind::TextList)
            .aliases(&["闪光点列表", "闪光点", "good_points"])
            .or(Fallback::List(&[])),
        Field::new("suggestions", FieldKind::TextList)
            .aliases(&["建议加油列表", "建议", "改进建议"])
            .or(Fallback::List(&[])),
    ],
};
