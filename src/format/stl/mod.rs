pub use self::exporter::StlExporter;

mod exporter;
