use super::node::{FieldType, NodeKind};

/// Display grouping for the graph editor's palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Basic,
    Collection,
    Logic,
    Integration,
    Terminal,
}

/// Static display metadata and defaults for one node kind. Pure data; the
/// only behavior the catalog carries is filling in defaults.
#[derive(Debug, Clone, Copy)]
pub struct KindDescriptor {
    pub kind: NodeKind,
    pub label: &'static str,
    pub category: Category,
}

/// Default prompt, destination field and value type for a question kind.
#[derive(Debug, Clone)]
pub struct QuestionDefaults {
    pub prompt: &'static str,
    pub field: &'static str,
    pub field_type: FieldType,
    pub options: &'static [&'static str],
}

const DESCRIPTORS: &[KindDescriptor] = &[
    KindDescriptor { kind: NodeKind::Greeting, label: "Saudacao", category: Category::Basic },
    KindDescriptor { kind: NodeKind::Message, label: "Mensagem", category: Category::Basic },
    KindDescriptor { kind: NodeKind::Question, label: "Pergunta", category: Category::Collection },
    KindDescriptor { kind: NodeKind::Name, label: "Nome", category: Category::Collection },
    KindDescriptor { kind: NodeKind::Email, label: "Email", category: Category::Collection },
    KindDescriptor { kind: NodeKind::Phone, label: "Telefone", category: Category::Collection },
    KindDescriptor { kind: NodeKind::City, label: "Cidade", category: Category::Collection },
    KindDescriptor { kind: NodeKind::Interest, label: "Interesse", category: Category::Collection },
    KindDescriptor { kind: NodeKind::Budget, label: "Orcamento", category: Category::Collection },
    KindDescriptor { kind: NodeKind::Urgency, label: "Urgencia", category: Category::Collection },
    KindDescriptor { kind: NodeKind::Condition, label: "Condicao", category: Category::Logic },
    KindDescriptor { kind: NodeKind::Switch, label: "Switch", category: Category::Logic },
    KindDescriptor { kind: NodeKind::Parallel, label: "Paralelo", category: Category::Logic },
    KindDescriptor { kind: NodeKind::Action, label: "Acao", category: Category::Integration },
    KindDescriptor { kind: NodeKind::Handoff, label: "Atendimento humano", category: Category::Terminal },
    KindDescriptor { kind: NodeKind::Followup, label: "Follow-up", category: Category::Integration },
    KindDescriptor { kind: NodeKind::End, label: "Fim", category: Category::Terminal },
];

/// The static registry of node kinds.
pub struct Catalog;

impl Catalog {
    pub fn all() -> &'static [KindDescriptor] {
        DESCRIPTORS
    }

    pub fn descriptor(kind: NodeKind) -> &'static KindDescriptor {
        DESCRIPTORS
            .iter()
            .find(|d| d.kind == kind)
            .expect("every kind has a descriptor")
    }

    /// Defaults applied when lowering a question kind. Explicit config in the
    /// document always wins over these.
    pub fn question_defaults(kind: NodeKind) -> Option<QuestionDefaults> {
        let defaults = match kind {
            NodeKind::Question => QuestionDefaults {
                prompt: "Por favor, responda:",
                field: "resposta",
                field_type: FieldType::Text,
                options: &[],
            },
            NodeKind::Name => QuestionDefaults {
                prompt: "Qual e o seu nome?",
                field: "nome",
                field_type: FieldType::Text,
                options: &[],
            },
            NodeKind::Email => QuestionDefaults {
                prompt: "Qual seu email?",
                field: "email",
                field_type: FieldType::Email,
                options: &[],
            },
            NodeKind::Phone => QuestionDefaults {
                prompt: "Qual seu telefone?",
                field: "telefone",
                field_type: FieldType::Phone,
                options: &[],
            },
            NodeKind::City => QuestionDefaults {
                prompt: "Em qual cidade voce esta?",
                field: "cidade",
                field_type: FieldType::Text,
                options: &[],
            },
            NodeKind::Interest => QuestionDefaults {
                prompt: "No que posso ajuda-lo?",
                field: "interesse",
                field_type: FieldType::Text,
                options: &[],
            },
            NodeKind::Budget => QuestionDefaults {
                prompt: "Qual seu orcamento?",
                field: "orcamento",
                field_type: FieldType::Number,
                options: &[],
            },
            NodeKind::Urgency => QuestionDefaults {
                prompt: "Qual a urgencia?",
                field: "urgencia",
                field_type: FieldType::Choice,
                options: &["Baixa", "Media", "Alta", "Urgente"],
            },
            _ => return None,
        };
        Some(defaults)
    }

    pub fn default_greeting() -> &'static str {
        "Ola! Como posso ajudar?"
    }
}
