//! Registry of the FIAS entity kinds.
//!
//! The order of [`FIAS_ENTITIES`] is also the order of the status slots.
//! Column sizes follow the published FIAS XSD.

use crate::coercion::CoercionKind::{
    Boolean, Date, Integer, OptionalDate, OptionalInteger, OptionalText, OptionalUuid, Text, Uuid,
};
use crate::error::{FiasLoaderError, Result};
use crate::schema::{EntitySchema, FieldMapping};

/// Actual status (`ActualStatus`)
pub const ACTUAL_STATUS: EntitySchema = EntitySchema {
    table_name: "actstat",
    element_name: "ActualStatus",
    ddl: "CREATE TABLE actstat (
        act_stat_id INT UNIQUE NOT NULL,
        name VARCHAR(100) NOT NULL,
        PRIMARY KEY (act_stat_id))",
    fields: &[
        FieldMapping::new("ACTSTATID", "act_stat_id", Integer),
        FieldMapping::new("NAME", "name", Text),
    ],
};

/// Address object (`Object`)
pub const ADDRESS_OBJECT: EntitySchema = EntitySchema {
    table_name: "addrobj",
    element_name: "Object",
    ddl: "CREATE TABLE addrobj (
        ao_guid UUID NOT NULL,
        formal_name VARCHAR(120) NOT NULL,
        region_code VARCHAR(2) NOT NULL,
        auto_code VARCHAR(1) NOT NULL,
        area_code VARCHAR(3) NOT NULL,
        city_code VARCHAR(3) NOT NULL,
        ctar_code VARCHAR(3) NOT NULL,
        place_code VARCHAR(3) NOT NULL,
        street_code VARCHAR(4),
        extr_code VARCHAR(4) NOT NULL,
        sext_code VARCHAR(3) NOT NULL,
        off_name VARCHAR(120),
        postal_code VARCHAR(6),
        ifns_fl VARCHAR(4),
        terr_ifns_fl VARCHAR(4),
        ifns_ul VARCHAR(4),
        terr_ifns_ul VARCHAR(4),
        okato VARCHAR(11),
        oktmo VARCHAR(11),
        update_date DATE NOT NULL,
        short_name VARCHAR(10) NOT NULL,
        ao_level INT NOT NULL,
        parent_guid UUID,
        ao_id UUID NOT NULL,
        prev_id UUID,
        next_id UUID,
        code VARCHAR(17),
        plain_code VARCHAR(15),
        act_status INT NOT NULL,
        cent_status INT NOT NULL,
        oper_status INT NOT NULL,
        curr_status INT NOT NULL,
        start_date DATE NOT NULL,
        end_date DATE NOT NULL,
        norm_doc UUID,
        live_status BOOL NOT NULL,
        PRIMARY KEY (ao_id))",
    fields: &[
        FieldMapping::new("AOGUID", "ao_guid", Uuid),
        FieldMapping::new("FORMALNAME", "formal_name", Text),
        FieldMapping::new("REGIONCODE", "region_code", Text),
        FieldMapping::new("AUTOCODE", "auto_code", Text),
        FieldMapping::new("AREACODE", "area_code", Text),
        FieldMapping::new("CITYCODE", "city_code", Text),
        FieldMapping::new("CTARCODE", "ctar_code", Text),
        FieldMapping::new("PLACECODE", "place_code", Text),
        FieldMapping::new("STREETCODE", "street_code", OptionalText),
        FieldMapping::new("EXTRCODE", "extr_code", Text),
        FieldMapping::new("SEXTCODE", "sext_code", Text),
        FieldMapping::new("OFFNAME", "off_name", OptionalText),
        FieldMapping::new("POSTALCODE", "postal_code", OptionalText),
        FieldMapping::new("IFNSFL", "ifns_fl", OptionalText),
        FieldMapping::new("TERRIFNSFL", "terr_ifns_fl", OptionalText),
        FieldMapping::new("IFNSUL", "ifns_ul", OptionalText),
        FieldMapping::new("TERRIFNSUL", "terr_ifns_ul", OptionalText),
        FieldMapping::new("OKATO", "okato", OptionalText),
        FieldMapping::new("OKTMO", "oktmo", OptionalText),
        FieldMapping::new("UPDATEDATE", "update_date", Date),
        FieldMapping::new("SHORTNAME", "short_name", Text),
        FieldMapping::new("AOLEVEL", "ao_level", Integer),
        FieldMapping::new("PARENTGUID", "parent_guid", OptionalUuid),
        FieldMapping::new("AOID", "ao_id", Uuid),
        FieldMapping::new("PREVID", "prev_id", OptionalUuid),
        FieldMapping::new("NEXTID", "next_id", OptionalUuid),
        FieldMapping::new("CODE", "code", OptionalText),
        FieldMapping::new("PLAINCODE", "plain_code", OptionalText),
        FieldMapping::new("ACTSTATUS", "act_status", Integer),
        FieldMapping::new("CENTSTATUS", "cent_status", Integer),
        FieldMapping::new("OPERSTATUS", "oper_status", Integer),
        FieldMapping::new("CURRSTATUS", "curr_status", Integer),
        FieldMapping::new("STARTDATE", "start_date", Date),
        FieldMapping::new("ENDDATE", "end_date", Date),
        FieldMapping::new("NORMDOC", "norm_doc", OptionalUuid),
        FieldMapping::new("LIVESTATUS", "live_status", Boolean),
    ],
};

/// Center status (`CenterStatus`)
pub const CENTER_STATUS: EntitySchema = EntitySchema {
    table_name: "centerst",
    element_name: "CenterStatus",
    ddl: "CREATE TABLE centerst (
        center_st_id INT UNIQUE NOT NULL,
        name VARCHAR(100) NOT NULL,
        PRIMARY KEY (center_st_id))",
    fields: &[
        FieldMapping::new("CENTERSTID", "center_st_id", Integer),
        FieldMapping::new("NAME", "name", Text),
    ],
};

/// Current status (`CurrentStatus`)
pub const CURRENT_STATUS: EntitySchema = EntitySchema {
    table_name: "curentst",
    element_name: "CurrentStatus",
    ddl: "CREATE TABLE curentst (
        cur_ent_st_id INT UNIQUE NOT NULL,
        name VARCHAR(100) NOT NULL,
        PRIMARY KEY (cur_ent_st_id))",
    fields: &[
        FieldMapping::new("CURENTSTID", "cur_ent_st_id", Integer),
        FieldMapping::new("NAME", "name", Text),
    ],
};

/// Estate status (`EstateStatus`)
pub const ESTATE_STATUS: EntitySchema = EntitySchema {
    table_name: "eststat",
    element_name: "EstateStatus",
    ddl: "CREATE TABLE eststat (
        est_stat_id INT UNIQUE NOT NULL,
        name VARCHAR(20) NOT NULL,
        short_name VARCHAR(20),
        PRIMARY KEY (est_stat_id))",
    fields: &[
        FieldMapping::new("ESTSTATID", "est_stat_id", Integer),
        FieldMapping::new("NAME", "name", Text),
        FieldMapping::new("SHORTNAME", "short_name", OptionalText),
    ],
};

/// House (`House`)
pub const HOUSE: EntitySchema = EntitySchema {
    table_name: "house",
    element_name: "House",
    ddl: "CREATE TABLE house (
        postal_code VARCHAR(6),
        ifns_fl VARCHAR(4),
        terr_ifns_fl VARCHAR(4),
        ifns_ul VARCHAR(4),
        terr_ifns_ul VARCHAR(4),
        okato VARCHAR(11),
        oktmo VARCHAR(11),
        update_date DATE NOT NULL,
        house_num VARCHAR(20),
        est_status INT NOT NULL,
        build_num VARCHAR(10),
        struc_num VARCHAR(10),
        str_status INT,
        house_id UUID NOT NULL,
        house_guid UUID NOT NULL,
        ao_guid UUID NOT NULL,
        start_date DATE NOT NULL,
        end_date DATE NOT NULL,
        stat_status INT NOT NULL,
        norm_doc UUID,
        counter INT NOT NULL,
        PRIMARY KEY (house_id))",
    fields: &[
        FieldMapping::new("POSTALCODE", "postal_code", OptionalText),
        FieldMapping::new("IFNSFL", "ifns_fl", OptionalText),
        FieldMapping::new("TERRIFNSFL", "terr_ifns_fl", OptionalText),
        FieldMapping::new("IFNSUL", "ifns_ul", OptionalText),
        FieldMapping::new("TERRIFNSUL", "terr_ifns_ul", OptionalText),
        FieldMapping::new("OKATO", "okato", OptionalText),
        FieldMapping::new("OKTMO", "oktmo", OptionalText),
        FieldMapping::new("UPDATEDATE", "update_date", Date),
        FieldMapping::new("HOUSENUM", "house_num", OptionalText),
        FieldMapping::new("ESTSTATUS", "est_status", Integer),
        FieldMapping::new("BUILDNUM", "build_num", OptionalText),
        FieldMapping::new("STRUCNUM", "struc_num", OptionalText),
        FieldMapping::new("STRSTATUS", "str_status", OptionalInteger),
        FieldMapping::new("HOUSEID", "house_id", Uuid),
        FieldMapping::new("HOUSEGUID", "house_guid", Uuid),
        FieldMapping::new("AOGUID", "ao_guid", Uuid),
        FieldMapping::new("STARTDATE", "start_date", Date),
        FieldMapping::new("ENDDATE", "end_date", Date),
        FieldMapping::new("STATSTATUS", "stat_status", Integer),
        FieldMapping::new("NORMDOC", "norm_doc", OptionalUuid),
        FieldMapping::new("COUNTER", "counter", Integer),
    ],
};

/// House number interval (`HouseInterval`)
pub const HOUSE_INTERVAL: EntitySchema = EntitySchema {
    table_name: "houseint",
    element_name: "HouseInterval",
    ddl: "CREATE TABLE houseint (
        postal_code VARCHAR(6),
        ifns_fl VARCHAR(4),
        terr_ifns_fl VARCHAR(4),
        ifns_ul VARCHAR(4),
        terr_ifns_ul VARCHAR(4),
        okato VARCHAR(11),
        oktmo VARCHAR(11),
        update_date DATE NOT NULL,
        int_start INT NOT NULL,
        int_end INT NOT NULL,
        house_int_id UUID NOT NULL,
        int_guid UUID NOT NULL,
        ao_guid UUID NOT NULL,
        start_date DATE NOT NULL,
        end_date DATE NOT NULL,
        int_status INT NOT NULL,
        norm_doc UUID,
        counter INT NOT NULL,
        PRIMARY KEY (house_int_id))",
    fields: &[
        FieldMapping::new("POSTALCODE", "postal_code", OptionalText),
        FieldMapping::new("IFNSFL", "ifns_fl", OptionalText),
        FieldMapping::new("TERRIFNSFL", "terr_ifns_fl", OptionalText),
        FieldMapping::new("IFNSUL", "ifns_ul", OptionalText),
        FieldMapping::new("TERRIFNSUL", "terr_ifns_ul", OptionalText),
        FieldMapping::new("OKATO", "okato", OptionalText),
        FieldMapping::new("OKTMO", "oktmo", OptionalText),
        FieldMapping::new("UPDATEDATE", "update_date", Date),
        FieldMapping::new("INTSTART", "int_start", Integer),
        FieldMapping::new("INTEND", "int_end", Integer),
        FieldMapping::new("HOUSEINTID", "house_int_id", Uuid),
        FieldMapping::new("INTGUID", "int_guid", Uuid),
        FieldMapping::new("AOGUID", "ao_guid", Uuid),
        FieldMapping::new("STARTDATE", "start_date", Date),
        FieldMapping::new("ENDDATE", "end_date", Date),
        FieldMapping::new("INTSTATUS", "int_status", Integer),
        FieldMapping::new("NORMDOC", "norm_doc", OptionalUuid),
        FieldMapping::new("COUNTER", "counter", Integer),
    ],
};

/// House state status (`HouseStateStatus`)
pub const HOUSE_STATE_STATUS: EntitySchema = EntitySchema {
    table_name: "hststat",
    element_name: "HouseStateStatus",
    ddl: "CREATE TABLE hststat (
        house_st_id INT UNIQUE NOT NULL,
        name VARCHAR(60) NOT NULL,
        PRIMARY KEY (house_st_id))",
    fields: &[
        FieldMapping::new("HOUSESTID", "house_st_id", Integer),
        FieldMapping::new("NAME", "name", Text),
    ],
};

/// Interval status (`IntervalStatus`)
pub const INTERVAL_STATUS: EntitySchema = EntitySchema {
    table_name: "intvstat",
    element_name: "IntervalStatus",
    ddl: "CREATE TABLE intvstat (
        intv_stat_id INT UNIQUE NOT NULL,
        name VARCHAR(60) NOT NULL,
        PRIMARY KEY (intv_stat_id))",
    fields: &[
        FieldMapping::new("INTVSTATID", "intv_stat_id", Integer),
        FieldMapping::new("NAME", "name", Text),
    ],
};

/// Landmark description (`Landmark`)
pub const LANDMARK: EntitySchema = EntitySchema {
    table_name: "landmark",
    element_name: "Landmark",
    ddl: "CREATE TABLE landmark (
        location VARCHAR(500) NOT NULL,
        postal_code VARCHAR(6),
        ifns_fl VARCHAR(4),
        terr_ifns_fl VARCHAR(4),
        ifns_ul VARCHAR(4),
        terr_ifns_ul VARCHAR(4),
        okato VARCHAR(11),
        oktmo VARCHAR(11),
        update_date DATE NOT NULL,
        land_id UUID NOT NULL,
        land_guid UUID NOT NULL,
        ao_guid UUID NOT NULL,
        start_date DATE NOT NULL,
        end_date DATE NOT NULL,
        norm_doc UUID,
        PRIMARY KEY (land_id))",
    fields: &[
        FieldMapping::new("LOCATION", "location", Text),
        FieldMapping::new("POSTALCODE", "postal_code", OptionalText),
        FieldMapping::new("IFNSFL", "ifns_fl", OptionalText),
        FieldMapping::new("TERRIFNSFL", "terr_ifns_fl", OptionalText),
        FieldMapping::new("IFNSUL", "ifns_ul", OptionalText),
        FieldMapping::new("TERRIFNSUL", "terr_ifns_ul", OptionalText),
        FieldMapping::new("OKATO", "okato", OptionalText),
        FieldMapping::new("OKTMO", "oktmo", OptionalText),
        FieldMapping::new("UPDATEDATE", "update_date", Date),
        FieldMapping::new("LANDID", "land_id", Uuid),
        FieldMapping::new("LANDGUID", "land_guid", Uuid),
        FieldMapping::new("AOGUID", "ao_guid", Uuid),
        FieldMapping::new("STARTDATE", "start_date", Date),
        FieldMapping::new("ENDDATE", "end_date", Date),
        FieldMapping::new("NORMDOC", "norm_doc", OptionalUuid),
    ],
};

/// Normative document type (`NormativeDocumentType`)
pub const NORMATIVE_DOCUMENT_TYPE: EntitySchema = EntitySchema {
    table_name: "ndoctype",
    element_name: "NormativeDocumentType",
    ddl: "CREATE TABLE ndoctype (
        nd_type_id INT UNIQUE NOT NULL,
        name VARCHAR(250) NOT NULL,
        PRIMARY KEY (nd_type_id))",
    fields: &[
        FieldMapping::new("NDTYPEID", "nd_type_id", Integer),
        FieldMapping::new("NAME", "name", Text),
    ],
};

/// Normative document (`NormativeDocument`)
pub const NORMATIVE_DOCUMENT: EntitySchema = EntitySchema {
    table_name: "normdoc",
    element_name: "NormativeDocument",
    ddl: "CREATE TABLE normdoc (
        norm_doc_id UUID NOT NULL,
        doc_name TEXT,
        doc_date DATE,
        doc_num VARCHAR(20),
        doc_type INT NOT NULL,
        doc_img_id INT,
        PRIMARY KEY (norm_doc_id))",
    fields: &[
        FieldMapping::new("NORMDOCID", "norm_doc_id", Uuid),
        FieldMapping::new("DOCNAME", "doc_name", OptionalText),
        FieldMapping::new("DOCDATE", "doc_date", OptionalDate),
        FieldMapping::new("DOCNUM", "doc_num", OptionalText),
        FieldMapping::new("DOCTYPE", "doc_type", Integer),
        FieldMapping::new("DOCIMGID", "doc_img_id", OptionalInteger),
    ],
};

/// Operation status (`OperationStatus`)
pub const OPERATION_STATUS: EntitySchema = EntitySchema {
    table_name: "operstat",
    element_name: "OperationStatus",
    ddl: "CREATE TABLE operstat (
        oper_stat_id INT UNIQUE NOT NULL,
        name VARCHAR(100) NOT NULL,
        PRIMARY KEY (oper_stat_id))",
    fields: &[
        FieldMapping::new("OPERSTATID", "oper_stat_id", Integer),
        FieldMapping::new("NAME", "name", Text),
    ],
};

/// Address object type (`AddressObjectType`)
pub const ADDRESS_OBJECT_TYPE: EntitySchema = EntitySchema {
    table_name: "socrbase",
    element_name: "AddressObjectType",
    ddl: "CREATE TABLE socrbase (
        level INT NOT NULL,
        sc_name VARCHAR(10),
        socr_name VARCHAR(50) NOT NULL,
        kod_t_st VARCHAR(4) NOT NULL,
        PRIMARY KEY (kod_t_st))",
    fields: &[
        FieldMapping::new("LEVEL", "level", Integer),
        FieldMapping::new("SCNAME", "sc_name", OptionalText),
        FieldMapping::new("SOCRNAME", "socr_name", Text),
        FieldMapping::new("KOD_T_ST", "kod_t_st", Text),
    ],
};

/// Structure status (`StructureStatus`)
pub const STRUCTURE_STATUS: EntitySchema = EntitySchema {
    table_name: "strstat",
    element_name: "StructureStatus",
    ddl: "CREATE TABLE strstat (
        str_stat_id INT UNIQUE NOT NULL,
        name VARCHAR(20) NOT NULL,
        short_name VARCHAR(20),
        PRIMARY KEY (str_stat_id))",
    fields: &[
        FieldMapping::new("STRSTATID", "str_stat_id", Integer),
        FieldMapping::new("NAME", "name", Text),
        FieldMapping::new("SHORTNAME", "short_name", OptionalText),
    ],
};

/// All entity kinds in status-slot order.
pub static FIAS_ENTITIES: [EntitySchema; 15] = [
    ACTUAL_STATUS,
    ADDRESS_OBJECT,
    CENTER_STATUS,
    CURRENT_STATUS,
    ESTATE_STATUS,
    HOUSE,
    HOUSE_INTERVAL,
    HOUSE_STATE_STATUS,
    INTERVAL_STATUS,
    LANDMARK,
    NORMATIVE_DOCUMENT_TYPE,
    NORMATIVE_DOCUMENT,
    OPERATION_STATUS,
    ADDRESS_OBJECT_TYPE,
    STRUCTURE_STATUS,
];

/// Returns every registered entity schema.
pub fn fias_entities() -> Vec<&'static EntitySchema> {
    FIAS_ENTITIES.iter().collect()
}

/// Selects schemas by table name, keeping registry order.
///
/// An empty selection returns every schema.
///
/// # Errors
/// Returns a configuration error naming the first unknown table.
pub fn select(tables: &[String]) -> Result<Vec<&'static EntitySchema>> {
    if tables.is_empty() {
        return Ok(fias_entities());
    }

    if let Some(unknown) = tables.iter().find(|name| {
        !FIAS_ENTITIES
            .iter()
            .any(|schema| schema.table_name.eq_ignore_ascii_case(name))
    }) {
        return Err(FiasLoaderError::configuration(format!(
            "unknown entity table '{unknown}'"
        )));
    }

    Ok(FIAS_ENTITIES
        .iter()
        .filter(|schema| {
            tables
                .iter()
                .any(|name| schema.table_name.eq_ignore_ascii_case(name))
        })
        .collect())
}
