pub use self::exporter::ObjExporter;

mod exporter;
