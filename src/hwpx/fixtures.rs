//! In-memory HWPX packages for tests.

use crate::fixtures::{FixtureTable, Item, text};
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use zip::write::{SimpleFileOptions, ZipWriter};

const SECTION_OPEN: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes" ?><hs:sec xmlns:hs="http://www.hancom.co.kr/hwpml/2011/section" xmlns:hp="http://www.hancom.co.kr/hwpml/2011/paragraph">"#;
const SECTION_CLOSE: &str = "</hs:sec>";

pub(crate) const PREVIEW_TEXT: &[u8] = b"preview";

/// Wrap section content in the `<hs:sec>` root.
pub(crate) fn section(body: &str) -> String {
    format!("{SECTION_OPEN}{body}{SECTION_CLOSE}")
}

/// Section XML for paragraphs of items; memo bodies go to a trailing memo group.
#[derive(Debug, Default)]
pub(crate) struct SectionBuilder {
    body: String,
    memos: Vec<(u32, String)>,
    fields: u32,
    footnotes: u32,
    endnotes: u32,
}

impl SectionBuilder {
    pub(crate) fn paragraph(&mut self, items: &[Item]) -> &mut Self {
        let xml = self.paragraph_xml(items);
        self.body.push_str(&xml);
        self
    }

    fn paragraph_xml(&mut self, items: &[Item]) -> String {
        let mut run = String::new();
        for item in items {
            match item {
                Item::Text(s) => run.push_str(&format!("<hp:t>{}</hp:t>", escape(s.as_str()))),
                Item::Tab => run.push_str(r#"<hp:t><hp:tab width="4000" leader="0" type="1"/></hp:t>"#),
                Item::LineBreak => run.push_str("<hp:t><hp:lineBreak/></hp:t>"),
                Item::Footnote(body) => {
                    self.footnotes += 1;
                    let inner = self.paragraph_xml(&[text(body)]);
                    run.push_str(&format!(
                        r#"<hp:ctrl><hp:footNote number="{}" instId="{}"><hp:subList id="" textDirection="HORIZONTAL">{inner}</hp:subList></hp:footNote></hp:ctrl>"#,
                        self.footnotes,
                        1000 + self.footnotes
                    ));
                }
                Item::Endnote(body) => {
                    self.endnotes += 1;
                    let inner = self.paragraph_xml(&[text(body)]);
                    run.push_str(&format!(
                        r#"<hp:ctrl><hp:endNote number="{}" instId="{}"><hp:subList id="" textDirection="HORIZONTAL">{inner}</hp:subList></hp:endNote></hp:ctrl>"#,
                        self.endnotes,
                        2000 + self.endnotes
                    ));
                }
                Item::Link(target, display) => {
                    self.fields += 1;
                    let id = self.fields;
                    let command = format!("{};1;0;0;", target.replace(':', "\\:"));
                    run.push_str(&format!(
                        r#"<hp:ctrl><hp:fieldBegin id="{id}" type="HYPERLINK" name="" editable="0" dirty="0"><hp:parameters cnt="2" name=""><hp:integerParam name="Prop">0</hp:integerParam><hp:stringParam name="Command">{}</hp:stringParam></hp:parameters></hp:fieldBegin></hp:ctrl>"#,
                        escape(command.as_str())
                    ));
                    run.push_str(&format!("<hp:t>{}</hp:t>", escape(display.as_str())));
                    run.push_str(&format!(
                        r#"<hp:ctrl><hp:fieldEnd beginIDRef="{id}" fieldid="{id}"/></hp:ctrl>"#
                    ));
                }
                Item::Memo(anchor, body) => {
                    self.fields += 1;
                    let id = self.fields;
                    run.push_str(&format!(
                        r#"<hp:ctrl><hp:fieldBegin id="{id}" type="MEMO" name="" editable="1" dirty="0"><hp:parameters cnt="1" name=""><hp:integerParam name="MemoId">{id}</hp:integerParam></hp:parameters></hp:fieldBegin></hp:ctrl>"#
                    ));
                    run.push_str(&format!("<hp:t>{}</hp:t>", escape(anchor.as_str())));
                    run.push_str(&format!(
                        r#"<hp:ctrl><hp:fieldEnd beginIDRef="{id}" fieldid="{id}"/></hp:ctrl>"#
                    ));
                    self.memos.push((id, body.clone()));
                }
                Item::Table(table) => {
                    let xml = self.table_xml(table);
                    run.push_str(&xml);
                }
            }
        }
        format!(
            r#"<hp:p id="0" paraPrIDRef="0" styleIDRef="0" pageBreak="0" columnBreak="0" merged="0"><hp:run charPrIDRef="0">{run}</hp:run></hp:p>"#
        )
    }

    fn table_xml(&mut self, table: &FixtureTable) -> String {
        let mut xml = format!(
            r#"<hp:tbl id="1" rowCnt="{}" colCnt="{}" cellSpacing="0" borderFillIDRef="1">"#,
            table.rows, table.cols
        );
        let mut rows: Vec<u16> = table.cells.iter().map(|c| c.row).collect();
        rows.dedup();
        for row in rows {
            xml.push_str("<hp:tr>");
            for cell in table.cells.iter().filter(|c| c.row == row) {
                xml.push_str(r#"<hp:tc name="" header="0" hasMargin="0" protect="0" editable="0" dirty="0" borderFillIDRef="1"><hp:subList id="" textDirection="HORIZONTAL" vertAlign="CENTER">"#);
                for paragraph in &cell.paragraphs {
                    let inner = self.paragraph_xml(paragraph);
                    xml.push_str(&inner);
                }
                xml.push_str(&format!(
                    r#"</hp:subList><hp:cellAddr colAddr="{}" rowAddr="{}"/><hp:cellSpan colSpan="{}" rowSpan="{}"/><hp:cellSz width="1000" height="1000"/></hp:tc>"#,
                    cell.col, cell.row, cell.col_span, cell.row_span
                ));
            }
            xml.push_str("</hp:tr>");
        }
        xml.push_str("</hp:tbl>");
        xml
    }

    /// Finished section part, memo group last.
    pub(crate) fn finish(&mut self) -> String {
        let mut body = std::mem::take(&mut self.body);
        let memos = std::mem::take(&mut self.memos);
        if !memos.is_empty() {
            body.push_str("<hp:memogroup>");
            for (id, text_body) in memos {
                let inner = self.paragraph_xml(&[text(&text_body)]);
                body.push_str(&format!(
                    r#"<hp:memo id="{id}" memoShapeIDRef="0"><hp:paraList>{inner}</hp:paraList></hp:memo>"#
                ));
            }
            body.push_str("</hp:memogroup>");
        }
        section(&body)
    }
}

fn manifest(section_count: usize) -> String {
    let mut items = String::from(
        r#"<opf:item id="header" href="Contents/header.xml" media-type="application/xml"/>"#,
    );
    let mut spine = String::from(r#"<opf:itemref idref="header" linear="yes"/>"#);
    for index in 0..section_count {
        items.push_str(&format!(
            r#"<opf:item id="section{index}" href="Contents/section{index}.xml" media-type="application/xml"/>"#
        ));
        spine.push_str(&format!(r#"<opf:itemref idref="section{index}" linear="yes"/>"#));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes" ?><opf:package xmlns:opf="http://www.idpf.org/2007/opf/"><opf:manifest>{items}</opf:manifest><opf:spine>{spine}</opf:spine></opf:package>"#
    )
}

/// Zip section parts into a package; `with_manifest` adds `content.hpf`.
pub(crate) fn package(sections: &[String], with_manifest: bool) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let deflated =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    writer.start_file("mimetype", stored).unwrap();
    writer.write_all(b"application/hwp+zip").unwrap();
    if with_manifest {
        writer.start_file("Contents/content.hpf", deflated).unwrap();
        writer.write_all(manifest(sections.len()).as_bytes()).unwrap();
    }
    writer.start_file("Contents/header.xml", deflated).unwrap();
    writer
        .write_all(br#"<hh:head xmlns:hh="http://www.hancom.co.kr/hwpml/2011/head"><hh:beginNum page="1" footnote="1" endnote="1"/></hh:head>"#)
        .unwrap();
    for (index, xml) in sections.iter().enumerate() {
        writer
            .start_file(format!("Contents/section{index}.xml"), deflated)
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
    }
    writer.start_file("Preview/PrvText.txt", stored).unwrap();
    writer.write_all(PREVIEW_TEXT).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Build a complete HWPX package from sections of paragraphs.
pub(crate) fn document(sections: Vec<Vec<Vec<Item>>>) -> Vec<u8> {
    let parts: Vec<String> = sections
        .iter()
        .map(|paragraphs| {
            let mut builder = SectionBuilder::default();
            for items in paragraphs {
                builder.paragraph(items);
            }
            builder.finish()
        })
        .collect();
    package(&parts, true)
}
