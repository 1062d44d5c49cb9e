//! Built-in correction rules for Thai financial statements.
//!
//! Collected from balance sheets, income statements and cash-flow
//! statements run through Docling/Typhoon/PaddleOCR. Most entries come in
//! pairs: the raw OCR form with the gap still in it (for callers that
//! disable spacing repair) and the form left once the gap is closed.

use crate::corrections::{CorrectionRule, RuleCategory};

use RuleCategory::{CharacterCorruption, Other, Spacing, ToneMark, WordSegmentation};

pub(crate) const SUBSTRING_RULES: &[(&str, &str, RuleCategory)] = &[
    // Missing tone marks and vowels
    ("ลูกหนีการค า", "ลูกหนี้การค้า", Spacing),
    ("ลูกหนีการคา", "ลูกหนี้การค้า", ToneMark),
    ("หนีสิน", "หนี้สิน", ToneMark),
    ("หนิสิน", "หนี้สิน", CharacterCorruption),
    ("ทีดิน", "ที่ดิน", ToneMark),
    ("ที ดิน", "ที่ดิน", Spacing),
    ("เงินให กู ยืม", "เงินให้กู้ยืม", Spacing),
    ("เงินให้กู ยืม", "เงินให้กู้ยืม", Spacing),
    ("เงินให กูยืม", "เงินให้กู้ยืม", Spacing),
    ("เงินให กู ยืมระยะยาว", "เงินให้กู้ยืมระยะยาว", Spacing),
    ("เงินให กูยืมระยะยาว", "เงินให้กู้ยืมระยะยาว", Spacing),
    ("เจ าหนี", "เจ้าหนี้", Spacing),
    ("เจาหนี", "เจ้าหนี้", ToneMark),
    ("เจ้าหนี", "เจ้าหนี้", ToneMark),
    ("เจ ้าหนีการค า", "เจ้าหนี้การค้า", Spacing),
    ("เจ้าหนีการค า", "เจ้าหนี้การค้า", Spacing),
    ("เจ้าหนีการคา", "เจ้าหนี้การค้า", ToneMark),
    ("เจ าหนีอืน", "เจ้าหนี้อื่น", Spacing),
    ("เจาหนีอืน", "เจ้าหนี้อื่น", ToneMark),
    ("ค าใช จ าย", "ค่าใช้จ่าย", Spacing),
    ("คาใช จาย", "ค่าใช้จ่าย", Spacing),
    ("คาใชจาย", "ค่าใช้จ่าย", ToneMark),
    ("ค่าใช จ่าย", "ค่าใช้จ่าย", Spacing),
    ("ค่าใชจ่าย", "ค่าใช้จ่าย", ToneMark),
    ("ค่าใช จ่ายในการขาย", "ค่าใช้จ่ายในการขาย", Spacing),
    ("ค่าใชจ่ายในการขาย", "ค่าใช้จ่ายในการขาย", ToneMark),
    ("ค่าใช จ่ายในการบริหาร", "ค่าใช้จ่ายในการบริหาร", Spacing),
    ("ค่าใชจ่ายในการบริหาร", "ค่าใช้จ่ายในการบริหาร", ToneMark),
    ("ค่าใช จ่ายค างจ่าย", "ค่าใช้จ่ายค้างจ่าย", Spacing),
    ("ค่าใชจ่ายคางจ่าย", "ค่าใช้จ่ายค้างจ่าย", ToneMark),
    ("ค่าใช จ่ายจ่ายล่วงหน้า", "ค่าใช้จ่ายจ่ายล่วงหน้า", Spacing),
    ("ค าเสื่อม", "ค่าเสื่อม", Spacing),
    ("ค าเสื่อมราคา", "ค่าเสื่อมราคา", Spacing),
    ("คาเสื่อมราคา", "ค่าเสื่อมราคา", ToneMark),
    ("รายได ", "รายได้", Spacing),
    ("รายได", "รายได้", ToneMark),
    ("รายได้ อืน", "รายได้อื่น", Spacing),
    ("รายได้อืน", "รายได้อื่น", ToneMark),
    ("รายได้ ค้ างรับ", "รายได้ค้างรับ", Spacing),
    ("รายได้คางรับ", "รายได้ค้างรับ", ToneMark),
    ("สินทรัพย ", "สินทรัพย์", Spacing),
    ("สินทรัพย", "สินทรัพย์", ToneMark),
    ("หลักทรัพย ", "หลักทรัพย์", Spacing),
    ("หลักทรัพย", "หลักทรัพย์", ToneMark),
    ("สินค า", "สินค้า", Spacing),
    ("สินคา", "สินค้า", ToneMark),
    ("สินค าคงเหลือ", "สินค้าคงเหลือ", Spacing),
    ("สินคาคงเหลือ", "สินค้าคงเหลือ", ToneMark),
    ("เงินกู ยืม", "เงินกู้ยืม", Spacing),
    ("เงินกูยืม", "เงินกู้ยืม", ToneMark),
    ("เงินกู ยืมระยะยาว", "เงินกู้ยืมระยะยาว", Spacing),
    ("เงินกูยืมระยะยาว", "เงินกู้ยืมระยะยาว", ToneMark),
    ("เงินกู ยืมระยะสั้น", "เงินกู้ยืมระยะสั้น", Spacing),
    ("เงินกูยืมระยะสั้น", "เงินกู้ยืมระยะสั้น", ToneMark),
    ("เงินกู ยืมระยะยาวอืน", "เงินกู้ยืมระยะยาวอื่น", Spacing),
    ("เงินกูยืมระยะยาวอืน", "เงินกู้ยืมระยะยาวอื่น", ToneMark),
    ("อุปกรณ ", "อุปกรณ์", Spacing),
    ("อุปกรณ", "อุปกรณ์", ToneMark),
    // Broken SARA AM and stray NIKHAHIT
    ("จํากัด", "จำกัด", CharacterCorruption),
    ("จํากั ด", "จำกัด", CharacterCorruption),
    ("จากัด", "จำกัด", CharacterCorruption),
    ("กําไร", "กำไร", CharacterCorruption),
    ("กาไร", "กำไร", CharacterCorruption),
    ("งบกาไรขาดทุน", "งบกำไรขาดทุน", CharacterCorruption),
    ("งบกําไรขาดทุน", "งบกำไรขาดทุน", CharacterCorruption),
    ("กําไรขาดทุน", "กำไรขาดทุน", CharacterCorruption),
    ("กําไรสุทธิ", "กำไรสุทธิ", CharacterCorruption),
    ("คํานวณ", "คำนวณ", CharacterCorruption),
    ("คานวณ", "คำนวณ", CharacterCorruption),
    ("จํานวนปี", "จำนวนปี", CharacterCorruption),
    ("จํานวนหุ ้น", "จำนวนหุ้น", CharacterCorruption),
    ("เรียกชําระแล ว", "เรียกชำระแล้ว", CharacterCorruption),
    // Split syllables
    ("ส่ วน", "ส่วน", Spacing),
    ("บั ญชี", "บัญชี", Spacing),
    ("รว ม", "รวม", Spacing),
    ("ทั้ งหมด", "ทั้งหมด", Spacing),
    ("ระยะสั น", "ระยะสั้น", Spacing),
    ("ระยะสัน", "ระยะสั้น", ToneMark),
    // Generic spell-check overcorrections of financial vocabulary
    ("ลูกหนี้หอการค้า", "ลูกหนี้การค้า", Other),
    ("ระยะทาง", "ระยะยาว", Other),
    // Cash-flow statement
    ("ดอกเบียจ่าย", "ดอกเบี้ยจ่าย", ToneMark),
    ("ดอกเบีย", "ดอกเบี้ย", ToneMark),
    ("ภาษีเงินได", "ภาษีเงินได้", ToneMark),
    ("ภาษี เงินได", "ภาษีเงินได้", Spacing),
    ("เงินได", "เงินได้", ToneMark),
    ("ภาษีเงินได นิติบุคคล", "ภาษีเงินได้นิติบุคคล", Spacing),
    ("ภาษีเงินไดนิติบุคคล", "ภาษีเงินได้นิติบุคคล", ToneMark),
    ("เงินได นิติบุคคล", "เงินได้นิติบุคคล", Spacing),
    ("เงินไดนิติบุคคล", "เงินได้นิติบุคคล", ToneMark),
    ("อืน", "อื่น", ToneMark),
    ("อืนๆ", "อื่นๆ", ToneMark),
    ("รายการอืนๆ", "รายการอื่นๆ", ToneMark),
    ("สินทรัพย์หมุนเวียนอืน", "สินทรัพย์หมุนเวียนอื่น", ToneMark),
    ("สินทรัพย์ไม่หมุนเวียนอืน", "สินทรัพย์ไม่หมุนเวียนอื่น", ToneMark),
    ("หนีสินหมุนเวียนอืน", "หนี้สินหมุนเวียนอื่น", ToneMark),
    ("หนีสินไม่หมุนเวียนอืน", "หนี้สินไม่หมุนเวียนอื่น", ToneMark),
    ("ระยะยาวอืน", "ระยะยาวอื่น", ToneMark),
    ("เงินลงทุน ระยะยาวอืน", "เงินลงทุนระยะยาวอื่น", Spacing),
    ("เพิมขึน", "เพิ่มขึ้น", ToneMark),
    ("เพิม", "เพิ่ม", ToneMark),
    ("เพิมเติม", "เพิ่มเติม", ToneMark),
    ("ค างจ่าย", "ค้างจ่าย", Spacing),
    ("คางจ่าย", "ค้างจ่าย", ToneMark),
    ("ค้ างรับ", "ค้างรับ", Spacing),
    ("คางรับ", "ค้างรับ", ToneMark),
    ("ต ้นงวด", "ต้นงวด", Spacing),
    ("ตนงวด", "ต้นงวด", ToneMark),
    ("ได ้มาจาก", "ได้มาจาก", Spacing),
    ("ไดมาจาก", "ได้มาจาก", ToneMark),
    ("ใช ้ไป", "ใช้ไป", Spacing),
    ("ใชไป", "ใช้ไป", ToneMark),
    ("ใช ้ไป ใน", "ใช้ไปใน", Spacing),
    ("วิธีทางอ ้อม", "วิธีทางอ้อม", Spacing),
    ("วิธีทางออม", "วิธีทางอ้อม", ToneMark),
    ("การปรับปรุงด วย", "การปรับปรุงด้วย", Spacing),
    ("การปรับปรุงดวย", "การปรับปรุงด้วย", ToneMark),
    ("การเปลียนแปลง", "การเปลี่ยนแปลง", ToneMark),
    ("เปลียนแปลง", "เปลี่ยนแปลง", ToneMark),
    ("มูลค่าทีตราไว", "มูลค่าที่ตราไว้", ToneMark),
    // Income statement
    ("ต้ นทุนสินค าทีขาย", "ต้นทุนสินค้าที่ขาย", Spacing),
    ("ต้นทุนสินค าทีขาย", "ต้นทุนสินค้าที่ขาย", Spacing),
    ("ต้นทุนสินคาทีขาย", "ต้นทุนสินค้าที่ขาย", ToneMark),
    ("สินค าทีขาย", "สินค้าที่ขาย", Spacing),
    ("สินคาทีขาย", "สินค้าที่ขาย", ToneMark),
    ("ทีขาย", "ที่ขาย", ToneMark),
    ("ต้ นทุนทางการเงิน", "ต้นทุนทางการเงิน", Spacing),
    ("ตนทุนทางการเงิน", "ต้นทุนทางการเงิน", ToneMark),
    ("ต้ นทุน", "ต้นทุน", Spacing),
    ("ตนทุน", "ต้นทุน", ToneMark),
    ("ผู ้ตรวจสอบบัญชี", "ผู้ตรวจสอบบัญชี", Spacing),
    // Parenthesized headings
    ("กําไร ( ขาดทุน )", "กำไร (ขาดทุน)", WordSegmentation),
    ("กําไร (ขาดทุน)", "กำไร (ขาดทุน)", CharacterCorruption),
    ("กําไร ( ขาดทุน ) สุทธิ", "กำไร (ขาดทุน) สุทธิ", WordSegmentation),
    ("( งบละเอียด )", "(งบละเอียด)", WordSegmentation),
];

/// Structural rules that need a regex rather than a literal pattern.
/// SARA AM is matched in both spellings because normalization may have
/// decomposed it by the time the dictionary runs.
pub(crate) const STRUCTURAL_RULES: &[(&str, &str, RuleCategory)] = &[
    (r"บริษัท\s+จ(?:ำ|ํา)กัด", "บริษัทจำกัด", Spacing),
];

pub(crate) fn builtin_rules() -> Vec<CorrectionRule> {
    SUBSTRING_RULES
        .iter()
        .map(|&(pattern, replacement, category)| {
            CorrectionRule::new(pattern, replacement, category)
        })
        .chain(
            STRUCTURAL_RULES
                .iter()
                .map(|&(pattern, replacement, category)| {
                    CorrectionRule::structural(pattern, replacement, category)
                }),
        )
        .collect()
}
