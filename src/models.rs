use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

/// Columns of the cost sheet, in the order they appear in the source workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    SupplierCode,
    DealerCategory,
    SupplierName,
    IssueDate,
    DocumentNumber,
    DocumentType,
    Installments,
    DueDate,
    Amount,
    TaskId,
    TaskAccount,
    TaskName,
    ConsolidatedTask,
    Category,
}

pub const ALL_FIELDS: &[Field] = &[
    Field::SupplierCode,
    Field::DealerCategory,
    Field::SupplierName,
    Field::IssueDate,
    Field::DocumentNumber,
    Field::DocumentType,
    Field::Installments,
    Field::DueDate,
    Field::Amount,
    Field::TaskId,
    Field::TaskAccount,
    Field::TaskName,
    Field::ConsolidatedTask,
    Field::Category,
];

impl Field {
    /// Column name used after normalization and in exports.
    pub fn canonical(&self) -> &'static str {
        match self {
            Self::SupplierCode => "COD_FORNECEDOR",
            Self::DealerCategory => "CATEGORIA_SCANIA",
            Self::SupplierName => "NOME_FORNECEDOR",
            Self::IssueDate => "DATA_EMISSAO",
            Self::DocumentNumber => "DOCUMENTO",
            Self::DocumentType => "TIPO_DOC",
            Self::Installments => "PARCELAS",
            Self::DueDate => "DATA_VENCIMENTO",
            Self::Amount => "VALOR",
            Self::TaskId => "TAREFA",
            Self::TaskAccount => "CONTA_TAREFA",
            Self::TaskName => "NOME_TAREFA",
            Self::ConsolidatedTask => "TAREFA_CONSOLIDADA",
            Self::Category => "CATEGORIA",
        }
    }

    /// Header spellings found in source workbooks.
    pub fn source_headers(&self) -> &'static [&'static str] {
        match self {
            Self::SupplierCode => &["CODIGO FORNECEDOR"],
            Self::DealerCategory => &["CATEGORIA SCANIA"],
            Self::SupplierName => &["NOME FORNECEDOR"],
            Self::IssueDate => &["DATA EMISSIO", "DATA EMISSAO", "DATA EMISSÃO"],
            Self::DocumentNumber => &["N. DOCUMENTO"],
            Self::DocumentType => &["TIPO DOC"],
            Self::Installments => &["N.PARCELAS"],
            Self::DueDate => &["DATA VENCIMENTO"],
            Self::Amount => &["VALOR"],
            Self::TaskId => &["N. TAREFA"],
            Self::TaskAccount => &["N.CONTA TAREFA"],
            Self::TaskName => &["NOME TAREFA"],
            Self::ConsolidatedTask => &["TAREFA CONSOLIDADA"],
            Self::Category => &["CATEGORIA"],
        }
    }

    /// Short label for table headers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SupplierCode => "Supplier Code",
            Self::DealerCategory => "Dealer",
            Self::SupplierName => "Supplier",
            Self::IssueDate => "Issued",
            Self::DocumentNumber => "Document",
            Self::DocumentType => "Doc Type",
            Self::Installments => "Inst.",
            Self::DueDate => "Due",
            Self::Amount => "Amount",
            Self::TaskId => "Task",
            Self::TaskAccount => "Task Account",
            Self::TaskName => "Task Name",
            Self::ConsolidatedTask => "Consolidated Task",
            Self::Category => "Category",
        }
    }

    /// Resolve a header cell to a field. Trims and ignores ASCII case; accepts
    /// both source spellings and canonical names.
    pub fn from_header(header: &str) -> Option<Field> {
        let h = header.trim();
        ALL_FIELDS.iter().copied().find(|f| {
            f.canonical().eq_ignore_ascii_case(h)
                || f.source_headers().iter().any(|s| s.eq_ignore_ascii_case(h))
        })
    }
}

/// Year/month bucket derived from a record's due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// `2023-01`
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// `Jan/2023`
    pub fn label(&self) -> String {
        format!("{}/{}", month_abbrev(self.month), self.year)
    }

    /// `Jan/23`, for narrow chart axes.
    pub fn short_label(&self) -> String {
        format!("{}/{:02}", month_abbrev(self.month), self.year.rem_euclid(100))
    }
}

pub fn month_abbrev(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        _ => "???",
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub supplier_code: Option<String>,
    pub dealer_category: Option<String>,
    pub supplier_name: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub document_number: Option<String>,
    pub document_type: Option<String>,
    pub installments: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub amount: f64,
    pub task_id: Option<String>,
    pub task_account: Option<String>,
    pub task_name: Option<String>,
    pub consolidated_task: Option<String>,
    pub category: Option<String>,
    /// Derived from `due_date` at load time.
    pub period: Option<Period>,
}

impl Record {
    /// Text value of a column, for grouping and multi-select filters.
    pub fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::SupplierCode => self.supplier_code.as_deref(),
            Field::DealerCategory => self.dealer_category.as_deref(),
            Field::SupplierName => self.supplier_name.as_deref(),
            Field::DocumentNumber => self.document_number.as_deref(),
            Field::DocumentType => self.document_type.as_deref(),
            Field::Installments => self.installments.as_deref(),
            Field::TaskId => self.task_id.as_deref(),
            Field::TaskAccount => self.task_account.as_deref(),
            Field::TaskName => self.task_name.as_deref(),
            Field::ConsolidatedTask => self.consolidated_task.as_deref(),
            Field::Category => self.category.as_deref(),
            Field::IssueDate | Field::DueDate | Field::Amount => None,
        }
    }

    pub fn text_mut(&mut self, field: Field) -> Option<&mut Option<String>> {
        match field {
            Field::SupplierCode => Some(&mut self.supplier_code),
            Field::DealerCategory => Some(&mut self.dealer_category),
            Field::SupplierName => Some(&mut self.supplier_name),
            Field::DocumentNumber => Some(&mut self.document_number),
            Field::DocumentType => Some(&mut self.document_type),
            Field::Installments => Some(&mut self.installments),
            Field::TaskId => Some(&mut self.task_id),
            Field::TaskAccount => Some(&mut self.task_account),
            Field::TaskName => Some(&mut self.task_name),
            Field::ConsolidatedTask => Some(&mut self.consolidated_task),
            Field::Category => Some(&mut self.category),
            Field::IssueDate | Field::DueDate | Field::Amount => None,
        }
    }

    /// Fill derived date keys from the due date.
    pub fn derive_period(&mut self) {
        self.period = self.due_date.map(Period::of);
    }
}

/// Ordered, immutable set of records plus the columns the source provided.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<Record>,
    pub columns: BTreeSet<Field>,
}

impl Dataset {
    pub fn new(records: Vec<Record>, columns: BTreeSet<Field>) -> Self {
        Self { records, columns }
    }

    pub fn has(&self, field: Field) -> bool {
        self.columns.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn total(&self) -> f64 {
        self.records.iter().map(|r| r.amount).sum()
    }
}
