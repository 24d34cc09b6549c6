//! Database module - PostgreSQL connection and schema

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Create database connection pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Apply the schema; every statement is idempotent
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Architectures under analysis
CREATE TABLE IF NOT EXISTS architectures (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    description TEXT,
    risk_tolerance DOUBLE PRECISION NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ DEFAULT NOW()
);

-- Assets
CREATE TABLE IF NOT EXISTS assets (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    architecture_id UUID NOT NULL REFERENCES architectures(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    criticality VARCHAR(20) NOT NULL DEFAULT 'medium',
    created_at TIMESTAMPTZ DEFAULT NOW()
);

-- Security attributes (confidentiality, integrity, ...) of an asset
CREATE TABLE IF NOT EXISTS security_attributes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    asset_id UUID NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
    kind VARCHAR(50) NOT NULL,
    compromise_cost DOUBLE PRECISION NOT NULL DEFAULT 0,
    priority VARCHAR(20) NOT NULL DEFAULT 'medium',
    created_at TIMESTAMPTZ DEFAULT NOW()
);

-- Threat catalogue
CREATE TABLE IF NOT EXISTS threats (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    severity VARCHAR(20) NOT NULL DEFAULT 'medium',
    created_at TIMESTAMPTZ DEFAULT NOW()
);

-- Attribute <-> threat with risk evaluation
CREATE TABLE IF NOT EXISTS attribute_threats (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    attribute_id UUID NOT NULL REFERENCES security_attributes(id) ON DELETE CASCADE,
    threat_id UUID NOT NULL REFERENCES threats(id) ON DELETE CASCADE,
    probability DOUBLE PRECISION NOT NULL DEFAULT 0,
    impact DOUBLE PRECISION NOT NULL DEFAULT 0,
    impact_cost DOUBLE PRECISION NOT NULL DEFAULT 0,
    UNIQUE (attribute_id, threat_id)
);

-- Control measure catalogue
CREATE TABLE IF NOT EXISTS control_measures (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    code VARCHAR(50),
    name VARCHAR(255) NOT NULL,
    nature VARCHAR(50) NOT NULL DEFAULT '',
    implementation_cost DOUBLE PRECISION NOT NULL DEFAULT 0,
    annual_maintenance_cost DOUBLE PRECISION NOT NULL DEFAULT 0,
    efficacy DOUBLE PRECISION NOT NULL DEFAULT 0,
    duration_days INT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ DEFAULT NOW()
);

-- Threat <-> measure with efficacy against that threat
CREATE TABLE IF NOT EXISTS threat_measures (
    threat_id UUID NOT NULL REFERENCES threats(id) ON DELETE CASCADE,
    measure_id UUID NOT NULL REFERENCES control_measures(id) ON DELETE CASCADE,
    efficacy DOUBLE PRECISION NOT NULL DEFAULT 0,
    compliance VARCHAR(30) NOT NULL DEFAULT 'not_applicable',
    PRIMARY KEY (threat_id, measure_id)
);

-- Implementation records produced by plans
CREATE TABLE IF NOT EXISTS implementations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    attribute_threat_id UUID NOT NULL REFERENCES attribute_threats(id) ON DELETE CASCADE,
    measure_id UUID NOT NULL REFERENCES control_measures(id) ON DELETE CASCADE,
    status VARCHAR(20) NOT NULL DEFAULT 'planned',
    completion DOUBLE PRECISION NOT NULL DEFAULT 0,
    owner_id UUID,
    comment TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (attribute_threat_id, measure_id)
);

-- Indexes for performance
CREATE INDEX IF NOT EXISTS idx_assets_architecture ON assets(architecture_id);
CREATE INDEX IF NOT EXISTS idx_attributes_asset ON security_attributes(asset_id);
CREATE INDEX IF NOT EXISTS idx_attribute_threats_attribute ON attribute_threats(attribute_id);
CREATE INDEX IF NOT EXISTS idx_threat_measures_threat ON threat_measures(threat_id);
CREATE INDEX IF NOT EXISTS idx_implementations_link ON implementations(attribute_threat_id);
"#;
