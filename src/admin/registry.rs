//! Change-list descriptors for the ERP entities.
//!
//! Each `ModelAdmin` names the columns shown in the list view (and written
//! by the spreadsheet export), the columns searched by `?q=`, the default
//! ordering and the page size.

use crate::models::EntityType;
use crate::models::entity::erp;
use serde::Serialize;

/// How a column's values are written to the spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    /// Amounts and quantities; decimal text is written as a number.
    Number,
    /// Dates and timestamps, rendered day-first.
    Date,
}

/// A list column: database column and its display header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Column {
    pub field: &'static str,
    pub header: &'static str,
    pub kind: ColumnKind,
}

const fn col(field: &'static str, header: &'static str) -> Column {
    Column {
        field,
        header,
        kind: ColumnKind::Text,
    }
}

const fn amount(field: &'static str, header: &'static str) -> Column {
    Column {
        field,
        header,
        kind: ColumnKind::Number,
    }
}

const fn date(field: &'static str, header: &'static str) -> Column {
    Column {
        field,
        header,
        kind: ColumnKind::Date,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Parse an ordering key; a leading `-` means descending.
pub fn parse_ordering(key: &str) -> (&str, SortDirection) {
    match key.strip_prefix('-') {
        Some(field) => (field, SortDirection::Desc),
        None => (key, SortDirection::Asc),
    }
}

/// Static admin configuration for one entity.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelAdmin {
    /// URL segment under `/admin/core/`.
    pub slug: &'static str,
    #[serde(skip)]
    pub entity: &'static EntityType,
    pub verbose_name_plural: &'static str,
    pub primary_key: &'static str,
    pub columns: &'static [Column],
    pub search_fields: &'static [&'static str],
    pub ordering: &'static [&'static str],
    pub page_size: u32,
    pub export_enabled: bool,
}

impl ModelAdmin {
    pub fn table(&self) -> &'static str {
        self.entity.table
    }

    /// Ordering keys, ending with the primary key so that pages never
    /// overlap when the declared ordering has ties.
    pub fn sort_keys(&self) -> Vec<(&'static str, SortDirection)> {
        let mut keys: Vec<_> = self.ordering.iter().map(|key| parse_ordering(*key)).collect();
        if !keys.iter().any(|(field, _)| *field == self.primary_key) {
            keys.push((self.primary_key, SortDirection::Asc));
        }
        keys
    }

    pub fn headers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.header)
    }

    pub fn is_searchable(&self) -> bool {
        !self.search_fields.is_empty()
    }
}

const DISTRIBUTION_COLUMNS: &[Column] = &[
    col("id", "ID"),
    col("parent_id", "Parent"),
    col("item_index", "Item"),
    col("ccoddep", "Department Code"),
    col("cdesdep", "Department"),
    amount("nvaldep", "Amount"),
];

pub static MODEL_ADMINS: &[ModelAdmin] = &[
    ModelAdmin {
        slug: "categories",
        entity: &erp::CATEGORY,
        verbose_name_plural: "Categories",
        primary_key: "id",
        columns: &[
            col("id", "ID"),
            col("codigo", "Code"),
            col("descricao", "Description"),
            col("tipo_categoria", "Category Type"),
            col("natureza", "Nature"),
            col("conta_inativa", "Inactive"),
        ],
        search_fields: &["codigo", "descricao", "descricao_padrao"],
        ordering: &["codigo"],
        page_size: 25,
        export_enabled: false,
    },
    ModelAdmin {
        slug: "clients",
        entity: &erp::CLIENT,
        verbose_name_plural: "Clients",
        primary_key: "codigo_cliente_omie",
        columns: &[
            col("codigo_cliente_omie", "Omie Code"),
            col("razao_social", "Company Name"),
            col("nome_fantasia", "Trade Name"),
            col("cnpj_cpf", "CNPJ/CPF"),
            col("cidade", "City"),
            col("estado", "State"),
            col("inativo", "Inactive"),
        ],
        search_fields: &[
            "razao_social",
            "nome_fantasia",
            "cnpj_cpf",
            "codigo_cliente_integracao",
            "email",
        ],
        ordering: &["razao_social"],
        page_size: 25,
        export_enabled: false,
    },
    ModelAdmin {
        slug: "bank-accounts",
        entity: &erp::BANK_ACCOUNT,
        verbose_name_plural: "Bank Accounts",
        primary_key: "ncodcc",
        columns: &[
            col("ncodcc", "Account Code"),
            col("descricao", "Description"),
            col("codigo_banco", "Bank"),
            col("codigo_agencia", "Branch"),
            col("numero_conta_corrente", "Account Number"),
            col("tipo", "Type"),
            col("inativo", "Inactive"),
        ],
        search_fields: &["descricao", "numero_conta_corrente", "codigo_agencia", "ncodcc"],
        ordering: &["descricao"],
        page_size: 25,
        export_enabled: false,
    },
    ModelAdmin {
        slug: "accounts-payable",
        entity: &erp::ACCOUNT_PAYABLE,
        verbose_name_plural: "Accounts Payable",
        primary_key: "codigo_lancamento_omie",
        columns: &[
            col("codigo_lancamento_omie", "Entry Code"),
            col("codigo_cliente_fornecedor", "Supplier"),
            col("numero_documento", "Document Number"),
            amount("valor_documento", "Amount"),
            date("data_vencimento", "Due Date"),
            col("status_titulo", "Status"),
        ],
        search_fields: &["numero_documento", "codigo_lancamento_integracao"],
        ordering: &["-data_vencimento"],
        page_size: 25,
        export_enabled: false,
    },
    ModelAdmin {
        slug: "payable-distribution",
        entity: &erp::PAYABLE_DISTRIBUTION,
        verbose_name_plural: "Payable Distributions",
        primary_key: "id",
        columns: DISTRIBUTION_COLUMNS,
        search_fields: &["cdesdep"],
        ordering: &[],
        page_size: 20,
        export_enabled: false,
    },
    ModelAdmin {
        slug: "accounts-receivable",
        entity: &erp::ACCOUNT_RECEIVABLE,
        verbose_name_plural: "Accounts Receivable",
        primary_key: "codigo_lancamento_omie",
        columns: &[
            col("codigo_lancamento_omie", "Entry Code"),
            col("codigo_cliente_fornecedor", "Customer"),
            col("numero_documento", "Document Number"),
            amount("valor_documento", "Amount"),
            date("data_vencimento", "Due Date"),
            col("status_titulo", "Status"),
        ],
        search_fields: &["numero_documento", "codigo_lancamento_integracao"],
        ordering: &["-data_vencimento"],
        page_size: 25,
        export_enabled: false,
    },
    ModelAdmin {
        slug: "receivable-distribution",
        entity: &erp::RECEIVABLE_DISTRIBUTION,
        verbose_name_plural: "Receivable Distributions",
        primary_key: "id",
        columns: DISTRIBUTION_COLUMNS,
        search_fields: &["cdesdep"],
        ordering: &[],
        page_size: 20,
        export_enabled: false,
    },
    ModelAdmin {
        slug: "xml-documents",
        entity: &erp::XML_DOCUMENT,
        verbose_name_plural: "XML Documents",
        primary_key: "nidnf",
        columns: &[
            col("nidnf", "NF ID"),
            col("nnumero", "Number"),
            col("cserie", "Series"),
            amount("nvalor", "Amount"),
            date("demissao", "Issue Date"),
            col("cstatus", "Status"),
        ],
        search_fields: &["nnumero", "nchave"],
        ordering: &["-demissao"],
        page_size: 20,
        export_enabled: false,
    },
    ModelAdmin {
        slug: "product-families",
        entity: &erp::PRODUCT_FAMILY,
        verbose_name_plural: "Product Families",
        primary_key: "codigo",
        columns: &[
            col("codigo", "Code"),
            col("codfamilia", "Family Code"),
            col("nomefamilia", "Family Name"),
            col("codint", "Integration Code"),
            col("inativo", "Inactive"),
        ],
        search_fields: &["nomefamilia", "codint"],
        ordering: &["nomefamilia"],
        page_size: 20,
        export_enabled: false,
    },
    ModelAdmin {
        slug: "stock-locations",
        entity: &erp::STOCK_LOCATION,
        verbose_name_plural: "Stock Locations",
        primary_key: "codigo_local_estoque",
        columns: &[
            col("codigo_local_estoque", "Location ID"),
            col("codigo", "Code"),
            col("descricao", "Description"),
            col("tipo", "Type"),
            col("padrao", "Default"),
            col("inativo", "Inactive"),
        ],
        search_fields: &["descricao", "codigo"],
        ordering: &["descricao"],
        page_size: 20,
        export_enabled: false,
    },
    ModelAdmin {
        slug: "financial-movements",
        entity: &erp::FINANCIAL_MOVEMENT,
        verbose_name_plural: "Financial Movements",
        primary_key: "id",
        columns: &[
            col("id", "ID"),
            col("detalhes_cnumtitulo", "Title Number"),
            col("detalhes_ccodcateg", "Category"),
            amount("detalhes_nvalortitulo", "Amount"),
            date("detalhes_ddtvenc", "Due Date"),
            date("detalhes_ddtpagamento", "Payment Date"),
            col("detalhes_cstatus", "Status"),
        ],
        search_fields: &["detalhes_cnumtitulo"],
        ordering: &["-detalhes_ddtvenc"],
        page_size: 25,
        export_enabled: true,
    },
    ModelAdmin {
        slug: "invoices",
        entity: &erp::INVOICE,
        verbose_name_plural: "Invoices",
        primary_key: "nidnf",
        columns: &[
            col("nidnf", "NF ID"),
            col("ide_nnf", "Number"),
            col("destinatario_nome", "Recipient"),
            amount("total_icmstot_vnf", "Total"),
            date("ide_diemi", "Issue Date"),
        ],
        search_fields: &["ide_nnf", "destinatario_nome", "destinatario_cnpjcpf"],
        ordering: &["-ide_diemi"],
        page_size: 20,
        export_enabled: false,
    },
    ModelAdmin {
        slug: "invoice-items",
        entity: &erp::INVOICE_ITEM,
        verbose_name_plural: "Invoice Items",
        primary_key: "id",
        columns: &[
            col("id", "ID"),
            col("parent_id", "Parent"),
            col("item_index", "Item"),
            col("prod_xprod", "Product"),
            amount("prod_vprod", "Amount"),
            amount("prod_qcom", "Quantity"),
        ],
        search_fields: &["prod_xprod", "prod_cprod"],
        ordering: &[],
        page_size: 20,
        export_enabled: false,
    },
    ModelAdmin {
        slug: "service-invoices",
        entity: &erp::SERVICE_INVOICE,
        verbose_name_plural: "Service Invoices",
        primary_key: "id",
        columns: &[
            col("id", "ID"),
            col("cabecalho_ncodnf", "NFS-e Code"),
            col("cabecalho_crazaodestinatario", "Recipient"),
            amount("cabecalho_nvalornfse", "Amount"),
            date("emissao_cdataemissao", "Issue Date"),
        ],
        search_fields: &["cabecalho_crazaodestinatario", "cabecalho_ncodnf"],
        ordering: &[],
        page_size: 20,
        export_enabled: false,
    },
    ModelAdmin {
        slug: "sales-order-items",
        entity: &erp::SALES_ORDER_ITEM,
        verbose_name_plural: "Sales Order Items",
        primary_key: "id",
        columns: &[
            col("id", "ID"),
            col("parent_id", "Parent"),
            col("produto_codigo_produto", "Product Code"),
            col("produto_descricao", "Description"),
            amount("produto_quantidade", "Quantity"),
            amount("produto_valor_total", "Total"),
        ],
        search_fields: &["produto_descricao", "produto_codigo"],
        ordering: &[],
        page_size: 20,
        export_enabled: false,
    },
    ModelAdmin {
        slug: "sales-orders",
        entity: &erp::SALES_ORDER,
        verbose_name_plural: "Sales Orders",
        primary_key: "cabecalho_codigo_pedido",
        columns: &[
            col("cabecalho_codigo_pedido", "Order Code"),
            col("cabecalho_numero_pedido", "Order Number"),
            date("infocadastro_dinc", "Issue Date"),
            col("cabecalho_etapa", "Stage"),
            amount("total_pedido_valor_mercadorias", "Goods Value"),
        ],
        search_fields: &["cabecalho_numero_pedido", "cabecalho_codigo_pedido_integracao"],
        ordering: &["-cabecalho_numero_pedido"],
        page_size: 25,
        export_enabled: true,
    },
    ModelAdmin {
        slug: "projects",
        entity: &erp::PROJECT,
        verbose_name_plural: "Projects",
        primary_key: "codigo",
        columns: &[
            col("codigo", "Code"),
            col("nome", "Name"),
            col("codint", "Integration Code"),
            col("inativo", "Inactive"),
        ],
        search_fields: &["nome", "codint"],
        ordering: &["nome"],
        page_size: 25,
        export_enabled: false,
    },
    ModelAdmin {
        slug: "sellers",
        entity: &erp::SELLER,
        verbose_name_plural: "Sellers",
        primary_key: "codigo",
        columns: &[
            col("codigo", "Code"),
            col("nome", "Name"),
            col("email", "Email"),
            amount("comissao", "Commission"),
            col("inativo", "Inactive"),
        ],
        search_fields: &["nome", "email", "codint"],
        ordering: &["nome"],
        page_size: 25,
        export_enabled: false,
    },
];

/// Find the admin descriptor for a URL slug.
pub fn find_by_slug(slug: &str) -> Option<&'static ModelAdmin> {
    MODEL_ADMINS.iter().find(|admin| admin.slug == slug)
}
