//! Static registry of persisted entity types and their owning modules.
//!
//! Every table the service can touch is listed here with the module that
//! owns it. Ownership is fixed at build time: framework modules live on the
//! default connection, the `core` module follows the request's selected
//! database.

/// Module that owns a persisted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppModule {
    Auth,
    ContentTypes,
    Sessions,
    Admin,
    Messages,
    /// The ERP business data.
    Core,
    /// Any other module. Routed to the default connection.
    Other(&'static str),
}

/// Two-valued ownership classification of registered entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    Framework,
    Application,
}

impl AppModule {
    /// Framework-owned modules, always on the default connection.
    pub const FRAMEWORK: [AppModule; 5] = [
        AppModule::Auth,
        AppModule::ContentTypes,
        AppModule::Sessions,
        AppModule::Admin,
        AppModule::Messages,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AppModule::Auth => "auth",
            AppModule::ContentTypes => "contenttypes",
            AppModule::Sessions => "sessions",
            AppModule::Admin => "admin",
            AppModule::Messages => "messages",
            AppModule::Core => "core",
            AppModule::Other(label) => label,
        }
    }

    /// Look up a known module by label. Unknown labels return `None`.
    pub fn from_label(label: &str) -> Option<AppModule> {
        match label {
            "auth" => Some(AppModule::Auth),
            "contenttypes" => Some(AppModule::ContentTypes),
            "sessions" => Some(AppModule::Sessions),
            "admin" => Some(AppModule::Admin),
            "messages" => Some(AppModule::Messages),
            "core" => Some(AppModule::Core),
            _ => None,
        }
    }

    pub fn is_framework(&self) -> bool {
        Self::FRAMEWORK.contains(self)
    }

    /// `None` for modules that are neither framework nor application owned.
    pub fn ownership(&self) -> Option<Ownership> {
        match self {
            AppModule::Core => Some(Ownership::Application),
            m if m.is_framework() => Some(Ownership::Framework),
            _ => None,
        }
    }
}

impl std::fmt::Display for AppModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A persisted entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityType {
    pub name: &'static str,
    pub module: AppModule,
    pub table: &'static str,
}

impl EntityType {
    pub const fn new(name: &'static str, module: AppModule, table: &'static str) -> Self {
        Self { name, module, table }
    }

    pub fn ownership(&self) -> Option<Ownership> {
        self.module.ownership()
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

/// Framework-owned entities.
pub mod framework {
    use super::{AppModule, EntityType};

    pub const USER: EntityType = EntityType::new("user", AppModule::Auth, "auth_user");
    pub const GROUP: EntityType = EntityType::new("group", AppModule::Auth, "auth_group");
    pub const PERMISSION: EntityType =
        EntityType::new("permission", AppModule::Auth, "auth_permission");
    pub const CONTENT_TYPE: EntityType =
        EntityType::new("contenttype", AppModule::ContentTypes, "django_content_type");
    pub const SESSION: EntityType =
        EntityType::new("session", AppModule::Sessions, "django_session");
    pub const LOG_ENTRY: EntityType =
        EntityType::new("logentry", AppModule::Admin, "django_admin_log");
}

/// ERP entities owned by the `core` module.
pub mod erp {
    use super::{AppModule, EntityType};

    const fn core(name: &'static str, table: &'static str) -> EntityType {
        EntityType::new(name, AppModule::Core, table)
    }

    pub const CATEGORY: EntityType = core("categoria", "categoria_cadastro");
    pub const CLIENT: EntityType = core("cliente", "clientes_cadastro");
    pub const BANK_ACCOUNT: EntityType = core("conta_corrente", "conta_corrente_cadastro");
    pub const ACCOUNT_PAYABLE: EntityType = core("conta_pagar", "conta_pagar_cadastro");
    pub const PAYABLE_DISTRIBUTION: EntityType =
        core("conta_pagar_distribuicao", "conta_pagar_distribuicao");
    pub const ACCOUNT_RECEIVABLE: EntityType = core("conta_receber", "conta_receber_cadastro");
    pub const RECEIVABLE_DISTRIBUTION: EntityType =
        core("conta_receber_distribuicao", "conta_receber_distribuicao");
    pub const XML_DOCUMENT: EntityType = core("documento_xml", "documentos_xml");
    pub const PRODUCT_FAMILY: EntityType = core("familia", "familias_cadastro");
    pub const STOCK_LOCATION: EntityType = core("local_estoque", "locais_cadastro");
    pub const FINANCIAL_MOVEMENT: EntityType =
        core("movimento_financeiro", "movimentos_financeiros");
    pub const INVOICE: EntityType = core("nf", "nf_cadastro");
    pub const INVOICE_ITEM: EntityType = core("nf_item", "nf_cadastro_itens");
    pub const SERVICE_INVOICE: EntityType = core("nfse", "nfse_encontrada");
    pub const SALES_ORDER_ITEM: EntityType = core("pedido_venda_item", "pedido_venda_itens");
    pub const SALES_ORDER: EntityType = core("pedido_venda", "pedido_venda_produto");
    pub const PROJECT: EntityType = core("projeto", "projetos_cadastro");
    pub const SELLER: EntityType = core("vendedor", "vendedores_cadastro");
}

/// All registered entities.
pub static REGISTRY: &[EntityType] = &[
    framework::USER,
    framework::GROUP,
    framework::PERMISSION,
    framework::CONTENT_TYPE,
    framework::SESSION,
    framework::LOG_ENTRY,
    erp::CATEGORY,
    erp::CLIENT,
    erp::BANK_ACCOUNT,
    erp::ACCOUNT_PAYABLE,
    erp::PAYABLE_DISTRIBUTION,
    erp::ACCOUNT_RECEIVABLE,
    erp::RECEIVABLE_DISTRIBUTION,
    erp::XML_DOCUMENT,
    erp::PRODUCT_FAMILY,
    erp::STOCK_LOCATION,
    erp::FINANCIAL_MOVEMENT,
    erp::INVOICE,
    erp::INVOICE_ITEM,
    erp::SERVICE_INVOICE,
    erp::SALES_ORDER_ITEM,
    erp::SALES_ORDER,
    erp::PROJECT,
    erp::SELLER,
];

/// Find a registered entity by module and name.
pub fn lookup(module: AppModule, name: &str) -> Option<&'static EntityType> {
    REGISTRY
        .iter()
        .find(|e| e.module == module && e.name == name)
}

/// Modules with at least one registered entity, in registry order.
pub fn registered_modules() -> Vec<AppModule> {
    let mut modules = Vec::new();
    for entity in REGISTRY {
        if !modules.contains(&entity.module) {
            modules.push(entity.module);
        }
    }
    modules
}
