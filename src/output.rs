//! Tabular rendering of the `top` report.

use std::io::{self, Write};

use tabwriter::TabWriter;

use crate::top::{ContainerRow, NodeRow};

fn table<W: Write>(w: W) -> TabWriter<W> {
    TabWriter::new(w).minwidth(1).padding(3)
}

pub fn write_containers<W: Write>(w: W, rows: &[ContainerRow]) -> io::Result<()> {
    let mut tw = table(w);
    writeln!(tw, "NAMESPACE\tPOD\tCONTAINER\tSTATUS\tCPU(cores)\tMEMORY(bytes)\tNODE")?;
    for row in rows {
        writeln!(
            tw,
            "{}\t{}\t{}\t{}\t{}m\t{}Mi\t{}",
            row.namespace,
            row.pod,
            row.container,
            row.status,
            row.cpu_millis,
            row.memory_mebibytes,
            row.node
        )?;
    }
    tw.flush()
}

pub fn write_nodes<W: Write>(w: W, rows: &[NodeRow]) -> io::Result<()> {
    let mut tw = table(w);
    writeln!(tw, "NODE\tREADY\tCPU(cores)\tMEMORY(bytes)")?;
    for row in rows {
        writeln!(
            tw,
            "{}\t{}\t{}m\t{}Mi",
            row.node, row.ready, row.cpu_millis, row.memory_mebibytes
        )?;
    }
    tw.flush()
}

/// Container table, an empty line, then the node table.
pub fn write_report<W: Write>(
    mut w: W,
    containers: &[ContainerRow],
    nodes: &[NodeRow],
) -> io::Result<()> {
    write_containers(&mut w, containers)?;
    writeln!(w)?;
    write_nodes(&mut w, nodes)?;
    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn node_table_is_aligned() {
        let rows = [
            NodeRow {
                node: "cloud".into(),
                ready: "True".into(),
                cpu_millis: 1250,
                memory_mebibytes: 2048,
            },
            NodeRow {
                node: "edge".into(),
                ready: "Unknown".into(),
                cpu_millis: 0,
                memory_mebibytes: 0,
            },
        ];
        let out = render(|buf| write_nodes(buf, &rows));
        assert_eq!(
            out,
            concat!(
                "NODE    READY     CPU(cores)   MEMORY(bytes)\n",
                "cloud   True      1250m        2048Mi\n",
                "edge    Unknown   0m           0Mi\n",
            )
        );
    }

    #[test]
    fn report_separates_tables_with_blank_line() {
        let containers = [ContainerRow {
            namespace: "app".into(),
            pod: "web".into(),
            container: "nginx".into(),
            status: "Running".into(),
            cpu_millis: 3,
            memory_mebibytes: 64,
            node: "edge".into(),
        }];
        let nodes = [NodeRow {
            node: "edge".into(),
            ready: "True".into(),
            cpu_millis: 120,
            memory_mebibytes: 900,
        }];
        let out = render(|buf| write_report(buf, &containers, &nodes));
        assert_eq!(
            out,
            concat!(
                "NAMESPACE   POD   CONTAINER   STATUS    CPU(cores)   MEMORY(bytes)   NODE\n",
                "app         web   nginx       Running   3m           64Mi            edge\n",
                "\n",
                "NODE   READY   CPU(cores)   MEMORY(bytes)\n",
                "edge   True    120m         900Mi\n",
            )
        );
    }

    #[test]
    fn empty_tables_keep_headers() {
        let out = render(|buf| write_report(buf, &[], &[]));
        assert_eq!(
            out,
            concat!(
                "NAMESPACE   POD   CONTAINER   STATUS   CPU(cores)   MEMORY(bytes)   NODE\n",
                "\n",
                "NODE   READY   CPU(cores)   MEMORY(bytes)\n",
            )
        );
    }
}
